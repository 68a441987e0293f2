//! PNG page sink for on-screen previews.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{FilterType, overlay, resize};
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PxRect;

use super::{LABEL_FONT_SIZE, PageSink, SinkError};
use crate::geometry::Rect;

const GLYPH_WIDTH: usize = 5;
const GLYPH_HEIGHT: usize = 7;
/// Cap height of the label font relative to its size.
const CAP_HEIGHT: f32 = 0.72;

struct Palette {
    page_bg: Rgb<u8>,
    frame: Rgb<u8>,
    text: Rgb<u8>,
}

const PALETTE: Palette = Palette {
    page_bg: Rgb([0xff, 0xff, 0xff]),
    frame: Rgb([0x00, 0x00, 0x00]),
    text: Rgb([0x00, 0x00, 0x00]),
};

/// Rasterises pages for on-screen proofing.
///
/// Labels use a built-in 5x7 bitmap font, so previews only approximate the
/// typeset PDF text.
pub struct RasterSink {
    dpi: u32,
    paper_width: f32,
    paper_height: f32,
    current: Option<RgbImage>,
    pages: Vec<RgbImage>,
}

impl RasterSink {
    pub fn new(paper_width: f32, paper_height: f32, dpi: u32) -> Self {
        Self {
            dpi: dpi.clamp(36, 600),
            paper_width,
            paper_height,
            current: None,
            pages: Vec::new(),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    fn mm_to_px(&self, mm: f32) -> i32 {
        (mm / 25.4 * self.dpi as f32).round() as i32
    }

    /// Pixel box for a page-space rectangle (flips the y axis).
    fn to_px(&self, rect: Rect) -> (i32, i32, u32, u32) {
        let left = self.mm_to_px(rect.x);
        let top = self.mm_to_px(self.paper_height - rect.top());
        let width = self.mm_to_px(rect.width).max(1) as u32;
        let height = self.mm_to_px(rect.height).max(1) as u32;
        (left, top, width, height)
    }

    fn canvas(&mut self) -> Result<&mut RgbImage, SinkError> {
        self.current.as_mut().ok_or(SinkError::NoOpenPage)
    }
}

impl PageSink for RasterSink {
    type Output = Vec<RgbImage>;

    fn begin_page(&mut self) -> Result<(), SinkError> {
        if self.current.is_some() {
            return Err(SinkError::PageStillOpen(self.pages.len() + 1));
        }
        let width = self.mm_to_px(self.paper_width).max(1) as u32;
        let height = self.mm_to_px(self.paper_height).max(1) as u32;
        self.current = Some(ImageBuffer::from_pixel(width, height, PALETTE.page_bg));
        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect) -> Result<(), SinkError> {
        let (left, top, width, height) = self.to_px(rect);
        let canvas = self.canvas()?;
        draw_hollow_rect_mut(
            canvas,
            PxRect::at(left, top).of_size(width, height),
            PALETTE.frame,
        );
        Ok(())
    }

    fn draw_raster(&mut self, raster: &DynamicImage, rect: Rect) -> Result<(), SinkError> {
        let (left, top, width, height) = self.to_px(rect);
        // Codes stay crisp; artwork is smoothed.
        let filter = match raster {
            DynamicImage::ImageLuma8(_) => FilterType::Nearest,
            _ => FilterType::Triangle,
        };
        let scaled = resize(&raster.to_rgb8(), width, height, filter);
        let canvas = self.canvas()?;
        overlay(canvas, &scaled, left as i64, top as i64);
        Ok(())
    }

    fn draw_centered_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
    ) -> Result<(), SinkError> {
        let cap_px = LABEL_FONT_SIZE * CAP_HEIGHT / 72.0 * self.dpi as f32;
        let scale = ((cap_px / GLYPH_HEIGHT as f32).round() as u32).max(1);
        let advance = (GLYPH_WIDTH as i32 + 1) * scale as i32;
        let text_width = advance * text.chars().count() as i32 - scale as i32;
        let x = self.mm_to_px(center_x) - text_width / 2;
        let y = self.mm_to_px(self.paper_height - baseline_y) - (GLYPH_HEIGHT as i32 * scale as i32);
        let canvas = self.canvas()?;
        for (idx, ch) in text.chars().enumerate() {
            draw_glyph(canvas, x + idx as i32 * advance, y, ch, PALETTE.text, scale);
        }
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), SinkError> {
        let page = self.current.take().ok_or(SinkError::NoOpenPage)?;
        self.pages.push(page);
        Ok(())
    }

    fn finish(self) -> Result<Vec<RgbImage>, SinkError> {
        if self.current.is_some() {
            return Err(SinkError::PageStillOpen(self.pages.len() + 1));
        }
        Ok(self.pages)
    }
}

/// Write pages as `page_0001.png`, `page_0002.png`, ... into `dir`.
///
/// On failure, pages already written by this call are removed again.
pub fn save_previews(pages: &[RgbImage], dir: &Path) -> Result<Vec<PathBuf>, SinkError> {
    fs::create_dir_all(dir).map_err(|e| SinkError::Preview {
        path: dir.to_path_buf(),
        source: image::ImageError::IoError(e),
    })?;
    let mut written = Vec::with_capacity(pages.len());
    for (idx, page) in pages.iter().enumerate() {
        let path = dir.join(format!("page_{:04}.png", idx + 1));
        if let Err(source) = page.save(&path) {
            for done in written.iter().chain(std::iter::once(&path)) {
                let _ = fs::remove_file(done);
            }
            return Err(SinkError::Preview { path, source });
        }
        written.push(path);
    }
    Ok(written)
}

fn draw_glyph(image: &mut RgbImage, x: i32, y: i32, ch: char, color: Rgb<u8>, scale: u32) {
    let pattern = glyph_pattern(ch);
    for (row, bits) in pattern.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                let px = x + (col as i32 * scale as i32);
                let py = y + (row as i32 * scale as i32);
                draw_filled_rect_mut(image, PxRect::at(px, py).of_size(scale, scale), color);
            }
        }
    }
}

#[rustfmt::skip]
fn glyph_pattern(ch: char) -> [u8; GLYPH_HEIGHT] {
    match ch.to_ascii_uppercase() {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b10010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110],
        '/' => [0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000, 0b00000],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '#' => [0b01010, 0b11111, 0b01010, 0b01010, 0b11111, 0b01010, 0b01010],
        '+' => [0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000, 0b00000],
        // Anything else prints as a hollow box so unknown glyphs stay visible.
        ' ' => [0b00000; GLYPH_HEIGHT],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
    const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

    fn sink() -> RasterSink {
        RasterSink {
            dpi: 25,
            paper_width: 100.0,
            paper_height: 100.0,
            current: None,
            pages: Vec::new(),
        }
    }

    #[test]
    fn page_size_follows_dpi() {
        let mut sink = RasterSink::new(210.0, 297.0, 100);
        sink.begin_page().unwrap();
        sink.end_page().unwrap();
        let pages = sink.finish().unwrap();
        assert_eq!(pages[0].dimensions(), (827, 1169));
    }

    #[test]
    fn dpi_is_clamped() {
        assert_eq!(RasterSink::new(10.0, 10.0, 1).dpi(), 36);
        assert_eq!(RasterSink::new(10.0, 10.0, 5000).dpi(), 600);
    }

    #[test]
    fn frame_is_drawn_with_flipped_y_axis() {
        let mut sink = RasterSink::new(254.0, 254.0, 10); // clamped to 36 dpi
        sink.dpi = 10; // 1px == 2.54mm
        sink.begin_page().unwrap();
        sink.draw_rect(Rect::new(25.4, 25.4, 25.4, 25.4)).unwrap();
        sink.end_page().unwrap();
        let page = &sink.finish().unwrap()[0];
        assert_eq!(page.dimensions(), (100, 100));
        // 25.4mm above the bottom edge is the last pixel row before 90
        assert_eq!(page.get_pixel(10, 89), &BLACK);
        assert_eq!(page.get_pixel(10, 80), &BLACK);
        assert_eq!(page.get_pixel(15, 85), &WHITE);
        assert_eq!(page.get_pixel(50, 50), &WHITE);
    }

    #[test]
    fn raster_fills_its_box() {
        let mut sink = sink();
        sink.begin_page().unwrap();
        let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([255, 0, 0])));
        sink.draw_raster(&red, Rect::new(0.0, 0.0, 50.8, 50.8)).unwrap();
        sink.end_page().unwrap();
        let page = &sink.finish().unwrap()[0];
        let (w, h) = page.dimensions();
        assert_eq!(page.get_pixel(1, h - 2), &Rgb([255, 0, 0]));
        assert_eq!(page.get_pixel(w - 2, 1), &WHITE);
    }

    #[test]
    fn label_ink_sits_above_the_baseline() {
        let mut sink = RasterSink::new(100.0, 100.0, 300);
        sink.begin_page().unwrap();
        sink.draw_centered_text("A1", 50.0, 50.0).unwrap();
        sink.end_page().unwrap();
        let page = &sink.finish().unwrap()[0];
        let baseline_px = (50.0_f32 / 25.4 * 300.0).round() as u32;
        let inked_rows: Vec<u32> = (0..page.height())
            .filter(|&y| (0..page.width()).any(|x| page.get_pixel(x, y) == &BLACK))
            .collect();
        assert!(!inked_rows.is_empty());
        assert!(inked_rows.iter().all(|&y| y < baseline_px));
    }

    #[test]
    fn drawing_requires_an_open_page() {
        let mut sink = sink();
        assert!(matches!(
            sink.draw_centered_text("x", 1.0, 1.0),
            Err(SinkError::NoOpenPage)
        ));
        sink.begin_page().unwrap();
        assert!(matches!(sink.begin_page(), Err(SinkError::PageStillOpen(1))));
    }

    #[test]
    fn previews_are_numbered_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("preview");
        let pages = vec![RgbImage::new(2, 2), RgbImage::new(2, 2)];
        let written = save_previews(&pages, &target).unwrap();
        assert_eq!(
            written,
            vec![target.join("page_0001.png"), target.join("page_0002.png")]
        );
        assert!(written.iter().all(|p| p.is_file()));
    }

    #[test]
    fn failed_preview_write_removes_earlier_pages() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("preview");
        // A directory where the second page should go makes its save fail.
        std::fs::create_dir_all(target.join("page_0002.png")).unwrap();
        let pages = vec![RgbImage::new(2, 2), RgbImage::new(2, 2)];
        let err = save_previews(&pages, &target).unwrap_err();
        assert!(matches!(err, SinkError::Preview { .. }));
        assert!(!target.join("page_0001.png").exists());
    }
}
