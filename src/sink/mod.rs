//! Drawing surfaces the layout engine emits pages into.

mod metrics;
mod pdf;
mod raster;

use image::DynamicImage;
use thiserror::Error;

use crate::geometry::Rect;

pub use metrics::helvetica_width_pt;
pub use pdf::PdfSink;
pub use raster::{RasterSink, save_previews};

/// Font size of the identifier printed under the artwork, in points.
pub const LABEL_FONT_SIZE: f32 = 7.0;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("no page is open")]
    NoOpenPage,
    #[error("page {0} is still open")]
    PageStillOpen(usize),
    #[error("document has no pages")]
    NoPages,
    #[error("failed to build PDF: {0}")]
    Pdf(String),
    #[error("failed to write preview {path}")]
    Preview {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Abstract page-oriented drawing surface.
///
/// Coordinates are millimetres from the bottom-left corner of the page.
pub trait PageSink {
    type Output;

    fn begin_page(&mut self) -> Result<(), SinkError>;
    fn draw_rect(&mut self, rect: Rect) -> Result<(), SinkError>;
    /// Draw `raster` stretched to fill `rect`.
    fn draw_raster(&mut self, raster: &DynamicImage, rect: Rect) -> Result<(), SinkError>;
    /// Draw `text` horizontally centered on `center_x` with its baseline at `baseline_y`.
    fn draw_centered_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
    ) -> Result<(), SinkError>;
    fn end_page(&mut self) -> Result<(), SinkError>;
    /// Close the document. Called once, after the last page.
    fn finish(self) -> Result<Self::Output, SinkError>
    where
        Self: Sized;
}

/// Fans every drawing call out to two sinks.
pub struct TeeSink<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A: PageSink, B: PageSink> PageSink for TeeSink<A, B> {
    type Output = (A::Output, B::Output);

    fn begin_page(&mut self) -> Result<(), SinkError> {
        self.primary.begin_page()?;
        self.secondary.begin_page()
    }

    fn draw_rect(&mut self, rect: Rect) -> Result<(), SinkError> {
        self.primary.draw_rect(rect)?;
        self.secondary.draw_rect(rect)
    }

    fn draw_raster(&mut self, raster: &DynamicImage, rect: Rect) -> Result<(), SinkError> {
        self.primary.draw_raster(raster, rect)?;
        self.secondary.draw_raster(raster, rect)
    }

    fn draw_centered_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
    ) -> Result<(), SinkError> {
        self.primary.draw_centered_text(text, center_x, baseline_y)?;
        self.secondary.draw_centered_text(text, center_x, baseline_y)
    }

    fn end_page(&mut self) -> Result<(), SinkError> {
        self.primary.end_page()?;
        self.secondary.end_page()
    }

    fn finish(self) -> Result<Self::Output, SinkError> {
        Ok((self.primary.finish()?, self.secondary.finish()?))
    }
}
