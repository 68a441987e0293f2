//! Raster sources for the two card faces.

mod artwork;
mod code;

use std::path::PathBuf;

use image::DynamicImage;
use thiserror::Error;

use crate::catalog::Card;

pub use artwork::ArtworkLoader;
pub use code::{CodeRenderer, DEFAULT_BASE_URL};

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("cannot load artwork for card '{card}' from {path}")]
    Artwork {
        card: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot encode '{payload}' as a QR code: {reason}")]
    Code { payload: String, reason: String },
}

/// Produces the raster drawn into a card's cell.
pub trait FaceSource {
    fn render(&self, card: &Card) -> Result<DynamicImage, FaceError>;
}
