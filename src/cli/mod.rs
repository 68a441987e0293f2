//! Command-line interface wiring for the `tokensheet` binary.
//!
//! Pre-flight checks on the input and output paths run inside clap's value
//! parsers, so a bad invocation fails before the catalog is read.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokensheet::{
    Catalog, DEFAULT_BASE_URL, Grid, LayoutConfig, TokenOptions, render_batch, save_previews,
    write_new_file,
};

pub mod common;
pub mod utils;

use common::PaperArg;

/// Parsed CLI entrypoint for the `tokensheet` binary.
#[derive(Parser, Debug)]
#[command(
    name = "tokensheet",
    version,
    about = "Create printable token sheets: artwork fronts and mirrored QR-code backs"
)]
pub struct Cli {
    /// Card catalog: a JSON array of {"id": ..., "image": ...} records.
    #[arg(value_parser = utils::existing_file)]
    pub spec: PathBuf,

    /// Destination PDF. Must not exist yet.
    #[arg(default_value = "tokens.pdf", value_parser = utils::fresh_output)]
    pub output: PathBuf,

    /// Card side length in millimetres.
    #[arg(long, default_value_t = 60.0)]
    pub size: f32,

    /// Minimum page margin in millimetres.
    #[arg(long, default_value_t = 3.0)]
    pub margin: f32,

    /// Gap between the card frame and its artwork, in millimetres.
    #[arg(long = "img-padding", default_value_t = 1.0)]
    pub img_padding: f32,

    /// Gap between the card edge and its QR code, in millimetres.
    #[arg(long = "qr-padding", default_value_t = 3.0)]
    pub qr_padding: f32,

    /// Print each QR code four times (2x2) on the card back.
    #[arg(long = "multiple-qrs", action = ArgAction::Count)]
    pub multiple_qrs: u8,

    /// Paper size.
    #[arg(long, default_value_t = PaperArg::A4, value_enum)]
    pub paper: PaperArg,

    /// URL prefix the card id is appended to inside the QR code.
    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Also write a PNG preview of every page into this directory.
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Resolution of preview images.
    #[arg(long, default_value_t = 100)]
    pub dpi: u32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn token_options(&self) -> TokenOptions {
        TokenOptions {
            layout: LayoutConfig {
                paper: self.paper.into(),
                card_size: self.size,
                min_margin: self.margin,
                image_padding: self.img_padding,
                code_padding: self.qr_padding,
            },
            base_url: self.base_url.clone(),
            tiled_codes: self.multiple_qrs > 0,
            preview_dpi: self.preview.as_ref().map(|_| self.dpi),
        }
    }
}

/// Configure `env_logger`; `RUST_LOG` takes precedence over `-v`.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Generate the token sheet described by `cli`.
pub fn run(cli: Cli) -> Result<()> {
    let options = cli.token_options();
    // Surface an unusable grid before touching the catalog.
    Grid::compute(&options.layout).context("invalid layout")?;

    let catalog = Catalog::load(&cli.spec)
        .with_context(|| format!("failed to read catalog {}", cli.spec.display()))?;
    let batch = render_batch(&catalog, &options)?;

    write_new_file(&cli.output, &batch.pdf)?;
    if let Some(dir) = &cli.preview {
        match save_previews(&batch.previews, dir) {
            Ok(written) => {
                log::info!("wrote {} preview(s) to {}", written.len(), dir.display())
            }
            Err(err) => {
                let _ = fs::remove_file(&cli.output);
                return Err(err).context("failed to write previews");
            }
        }
    }

    let summary = batch.summary;
    println!(
        "Wrote {} card(s) on {} page(s) ({}x{} per page) to {}",
        summary.cards,
        summary.document_pages,
        summary.columns,
        summary.rows,
        cli.output.display()
    );
    println!("Batch fingerprint: {}", batch.fingerprint);
    Ok(())
}
