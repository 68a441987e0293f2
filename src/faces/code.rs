//! Code faces: QR codes pointing at each card's URL.

use image::imageops::overlay;
use image::{DynamicImage, GrayImage, Luma};
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode, Version};

use super::{FaceError, FaceSource};
use crate::catalog::Card;

pub const DEFAULT_BASE_URL: &str = "https://paperplay.eu/";

const MIN_VERSION: i16 = 3;
const MAX_VERSION: i16 = 40;
const MODULE_PX: u32 = 16;
const BORDER_MODULES: u32 = 1;

/// Renders the back face: a QR code for `base_url + identifier`.
#[derive(Debug, Clone)]
pub struct CodeRenderer {
    base_url: String,
    tiled: bool,
}

impl CodeRenderer {
    pub fn new<S: Into<String>>(base_url: S, tiled: bool) -> Self {
        Self {
            base_url: base_url.into(),
            tiled,
        }
    }

    pub fn payload(&self, card: &Card) -> String {
        format!("{}{}", self.base_url, card.identifier)
    }

    fn encode(&self, payload: &str) -> Result<QrCode, FaceError> {
        // Smallest version from MIN_VERSION upwards that holds the payload at level H.
        for version in MIN_VERSION..=MAX_VERSION {
            match QrCode::with_version(payload.as_bytes(), Version::Normal(version), EcLevel::H) {
                Ok(code) => return Ok(code),
                Err(QrError::DataTooLong) => continue,
                Err(err) => {
                    return Err(FaceError::Code {
                        payload: payload.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        Err(FaceError::Code {
            payload: payload.to_string(),
            reason: QrError::DataTooLong.to_string(),
        })
    }
}

impl FaceSource for CodeRenderer {
    fn render(&self, card: &Card) -> Result<DynamicImage, FaceError> {
        let payload = self.payload(card);
        let code = self.encode(&payload)?;
        log::trace!("encoded '{}' as {:?}", payload, code.version());

        let symbol = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(MODULE_PX, MODULE_PX)
            .build();
        let border = BORDER_MODULES * MODULE_PX;
        let mut framed = GrayImage::from_pixel(
            symbol.width() + 2 * border,
            symbol.height() + 2 * border,
            Luma([255]),
        );
        overlay(&mut framed, &symbol, border as i64, border as i64);

        let face = if self.tiled { tile_2x2(&framed) } else { framed };
        Ok(DynamicImage::ImageLuma8(face))
    }
}

fn tile_2x2(single: &GrayImage) -> GrayImage {
    let (w, h) = single.dimensions();
    let mut tiled = GrayImage::from_pixel(w * 2, h * 2, Luma([255]));
    for (dx, dy) in [(0, 0), (w, 0), (0, h), (w, h)] {
        overlay(&mut tiled, single, dx as i64, dy as i64);
    }
    tiled
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(id: &str) -> Card {
        Card::new(id, format!("{id}.png"))
    }

    #[test]
    fn payload_appends_identifier_to_base_url() {
        let renderer = CodeRenderer::new("https://example.test/t/", false);
        assert_eq!(renderer.payload(&card("a1")), "https://example.test/t/a1");
    }

    #[test]
    fn rendering_is_deterministic() {
        for tiled in [false, true] {
            let renderer = CodeRenderer::new(DEFAULT_BASE_URL, tiled);
            let first = renderer.render(&card("a1")).unwrap();
            let second = renderer.render(&card("a1")).unwrap();
            assert_eq!(first.as_bytes(), second.as_bytes());
        }
    }

    #[test]
    fn short_payload_uses_version_three() {
        let renderer = CodeRenderer::new(DEFAULT_BASE_URL, false);
        let img = renderer.render(&card("a1")).unwrap();
        // version 3 is 29 modules plus a one-module border on each side
        let expected = (29 + 2) * MODULE_PX;
        assert_eq!((img.width(), img.height()), (expected, expected));
    }

    #[test]
    fn long_payload_grows_the_symbol() {
        let renderer = CodeRenderer::new(DEFAULT_BASE_URL, false);
        let short = renderer.render(&card("a1")).unwrap();
        let long = renderer.render(&card(&"x".repeat(60))).unwrap();
        assert!(long.width() > short.width());
    }

    #[test]
    fn tiling_repeats_the_symbol_four_times() {
        let single = CodeRenderer::new(DEFAULT_BASE_URL, false)
            .render(&card("a1"))
            .unwrap()
            .to_luma8();
        let tiled = CodeRenderer::new(DEFAULT_BASE_URL, true)
            .render(&card("a1"))
            .unwrap()
            .to_luma8();
        let (w, h) = single.dimensions();
        assert_eq!(tiled.dimensions(), (2 * w, 2 * h));
        for (dx, dy) in [(0, 0), (w, 0), (0, h), (w, h)] {
            for y in 0..h {
                for x in 0..w {
                    assert_eq!(tiled.get_pixel(x + dx, y + dy), single.get_pixel(x, y));
                }
            }
        }
    }

    #[test]
    fn different_identifiers_give_different_codes() {
        let renderer = CodeRenderer::new(DEFAULT_BASE_URL, false);
        let a = renderer.render(&card("a1")).unwrap();
        let b = renderer.render(&card("a2")).unwrap();
        assert!(a.as_bytes() != b.as_bytes());
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let renderer = CodeRenderer::new(DEFAULT_BASE_URL, false);
        let err = renderer.render(&card(&"x".repeat(2000))).unwrap_err();
        assert!(matches!(err, FaceError::Code { .. }));
    }
}
