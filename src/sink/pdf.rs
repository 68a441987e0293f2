//! PDF page sink built on printpdf.

use std::io::{BufWriter, Write};

use ::image::{DynamicImage, GenericImageView};
use printpdf::*;

use super::metrics::helvetica_width_pt;
use super::{LABEL_FONT_SIZE, PageSink, SinkError};
use crate::geometry::{PT_PER_MM, Rect};

const LAYER_NAME: &str = "Layer 1";
/// Nominal raster resolution; images are scaled to their target box from here.
const IMAGE_DPI: f32 = 300.0;
const FRAME_THICKNESS_PT: f32 = 0.5;

/// Builds a PDF document in memory with printpdf.
pub struct PdfSink {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    paper_width: f32,
    paper_height: f32,
    unused_first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
    layer: Option<PdfLayerReference>,
    pages: usize,
}

impl PdfSink {
    pub fn new(title: &str, paper_width: f32, paper_height: f32) -> Result<Self, SinkError> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(paper_width), Mm(paper_height), LAYER_NAME);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SinkError::Pdf(e.to_string()))?;
        Ok(Self {
            doc,
            font,
            paper_width,
            paper_height,
            unused_first_page: Some((page1, layer1)),
            layer: None,
            pages: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    fn layer(&self) -> Result<&PdfLayerReference, SinkError> {
        self.layer.as_ref().ok_or(SinkError::NoOpenPage)
    }
}

impl PageSink for PdfSink {
    type Output = Vec<u8>;

    fn begin_page(&mut self) -> Result<(), SinkError> {
        if self.layer.is_some() {
            return Err(SinkError::PageStillOpen(self.pages));
        }
        // PdfDocument::new already created page one.
        let (page, layer) = match self.unused_first_page.take() {
            Some(first) => first,
            None => self
                .doc
                .add_page(Mm(self.paper_width), Mm(self.paper_height), LAYER_NAME),
        };
        let layer = self.doc.get_page(page).get_layer(layer);
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_outline_thickness(FRAME_THICKNESS_PT);
        self.layer = Some(layer);
        self.pages += 1;
        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect) -> Result<(), SinkError> {
        let points = vec![
            (Point::new(Mm(rect.x), Mm(rect.y)), false),
            (Point::new(Mm(rect.right()), Mm(rect.y)), false),
            (Point::new(Mm(rect.right()), Mm(rect.top())), false),
            (Point::new(Mm(rect.x), Mm(rect.top())), false),
        ];
        self.layer()?.add_line(Line {
            points,
            is_closed: true,
        });
        Ok(())
    }

    fn draw_raster(&mut self, raster: &DynamicImage, rect: Rect) -> Result<(), SinkError> {
        let layer = self.layer()?;
        let (width, height) = raster.dimensions();
        let (color_space, image_data, interpolate) = match raster {
            DynamicImage::ImageLuma8(gray) => (ColorSpace::Greyscale, gray.as_raw().clone(), false),
            other => (ColorSpace::Rgb, other.to_rgb8().into_raw(), true),
        };
        let image = Image::from(ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space,
            bits_per_component: ColorBits::Bit8,
            interpolate,
            image_data,
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        let natural_width = width as f32 / IMAGE_DPI * 25.4;
        let natural_height = height as f32 / IMAGE_DPI * 25.4;
        image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(rect.x)),
                translate_y: Some(Mm(rect.y)),
                scale_x: Some(rect.width / natural_width),
                scale_y: Some(rect.height / natural_height),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn draw_centered_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
    ) -> Result<(), SinkError> {
        let width = helvetica_width_pt(text, LABEL_FONT_SIZE) / PT_PER_MM;
        self.layer()?.use_text(
            text,
            LABEL_FONT_SIZE,
            Mm(center_x - width / 2.0),
            Mm(baseline_y),
            &self.font,
        );
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), SinkError> {
        self.layer.take().ok_or(SinkError::NoOpenPage)?;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, SinkError> {
        if self.layer.is_some() {
            return Err(SinkError::PageStillOpen(self.pages));
        }
        // An untouched first page would still be serialised.
        if self.page_count() == 0 {
            return Err(SinkError::NoPages);
        }
        log::debug!("serialising PDF with {} page(s)", self.pages);
        let mut buf = Vec::new();
        {
            let mut writer = BufWriter::new(&mut buf);
            self.doc
                .save(&mut writer)
                .map_err(|e| SinkError::Pdf(e.to_string()))?;
            writer.flush().map_err(|e| SinkError::Pdf(e.to_string()))?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_pdf_with_every_opened_page() {
        let mut sink = PdfSink::new("test", 210.0, 297.0).unwrap();
        for _ in 0..3 {
            sink.begin_page().unwrap();
            sink.draw_rect(Rect::new(10.0, 10.0, 60.0, 60.0)).unwrap();
            sink.draw_centered_text("a1", 40.0, 13.5).unwrap();
            sink.end_page().unwrap();
        }
        assert_eq!(sink.page_count(), 3);
        let bytes = sink.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    fn reported_page_count(pdf: &[u8]) -> Option<usize> {
        let text = String::from_utf8_lossy(pdf);
        let start = text.find("/Count")? + "/Count".len();
        text[start..]
            .trim_start()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok()
    }

    #[test]
    fn page_tree_counts_only_opened_pages() {
        let mut sink = PdfSink::new("test", 210.0, 297.0).unwrap();
        for _ in 0..4 {
            sink.begin_page().unwrap();
            sink.end_page().unwrap();
        }
        let bytes = sink.finish().unwrap();
        assert_eq!(reported_page_count(&bytes), Some(4));
    }

    #[test]
    fn finishing_without_pages_fails() {
        let sink = PdfSink::new("test", 210.0, 297.0).unwrap();
        assert!(matches!(sink.finish(), Err(SinkError::NoPages)));
    }

    #[test]
    fn drawing_without_a_page_fails() {
        let mut sink = PdfSink::new("test", 210.0, 297.0).unwrap();
        assert!(matches!(
            sink.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(SinkError::NoOpenPage)
        ));
    }

    #[test]
    fn finishing_with_an_open_page_fails() {
        let mut sink = PdfSink::new("test", 210.0, 297.0).unwrap();
        sink.begin_page().unwrap();
        assert!(matches!(sink.finish(), Err(SinkError::PageStillOpen(1))));
    }
}
