//! Image faces: card artwork decoded from disk.

use std::path::PathBuf;

use image::{DynamicImage, Rgb, RgbImage, Rgba};

use super::{FaceError, FaceSource};
use crate::catalog::Card;

/// Loads front-face artwork relative to the catalog directory.
#[derive(Debug, Clone)]
pub struct ArtworkLoader {
    base_dir: PathBuf,
}

impl ArtworkLoader {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn path_for(&self, card: &Card) -> PathBuf {
        self.base_dir.join(&card.image)
    }
}

impl FaceSource for ArtworkLoader {
    fn render(&self, card: &Card) -> Result<DynamicImage, FaceError> {
        let path = self.path_for(card);
        log::trace!("loading artwork {}", path.display());
        let decoded = image::open(&path).map_err(|source| FaceError::Artwork {
            card: card.identifier.clone(),
            path: path.clone(),
            source,
        })?;
        Ok(flatten_onto_white(&decoded))
    }
}

/// Composite any transparency against a white page.
pub(crate) fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(rgb)
}
