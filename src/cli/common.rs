//! Shared clap helper types.

use clap::ValueEnum;
use tokensheet::Paper;

/// Paper sizes accepted by `--paper`.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PaperArg {
    A4,
    A3,
    Letter,
}

impl From<PaperArg> for Paper {
    fn from(value: PaperArg) -> Paper {
        match value {
            PaperArg::A4 => Paper::A4,
            PaperArg::A3 => Paper::A3,
            PaperArg::Letter => Paper::Letter,
        }
    }
}
