//! End-to-end batch generation: catalog in, PDF bytes (and optional previews) out.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use sha2::{Digest, Sha256};

use crate::catalog::Catalog;
use crate::engine::{LayoutSummary, TokenLayout};
use crate::faces::{ArtworkLoader, CodeRenderer, DEFAULT_BASE_URL};
use crate::geometry::LayoutConfig;
use crate::sink::{PageSink, PdfSink, RasterSink, TeeSink};

const DOCUMENT_TITLE: &str = "Tokens";

/// Everything that shapes a generated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenOptions {
    pub layout: LayoutConfig,
    pub base_url: String,
    /// Repeat each code 2x2 inside its cell.
    pub tiled_codes: bool,
    /// Also rasterise every page at this resolution.
    pub preview_dpi: Option<u32>,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            tiled_codes: false,
            preview_dpi: None,
        }
    }
}

/// A fully assembled batch, not yet written anywhere.
#[derive(Debug)]
pub struct RenderedBatch {
    pub pdf: Vec<u8>,
    pub previews: Vec<RgbImage>,
    pub summary: LayoutSummary,
    pub fingerprint: String,
}

/// Lay out every card of `catalog` into an in-memory document.
pub fn render_batch(catalog: &Catalog, options: &TokenOptions) -> Result<RenderedBatch> {
    let artwork = ArtworkLoader::new(&catalog.base_dir);
    let codes = CodeRenderer::new(options.base_url.clone(), options.tiled_codes);
    let layout = TokenLayout::new(&options.layout, &artwork, &codes)
        .context("invalid layout configuration")?;
    let (paper_width, paper_height) = options.layout.paper.dimensions();
    let pdf = PdfSink::new(DOCUMENT_TITLE, paper_width, paper_height)?;

    let (pdf, previews, summary) = match options.preview_dpi {
        Some(dpi) => {
            let mut sink = TeeSink {
                primary: pdf,
                secondary: RasterSink::new(paper_width, paper_height, dpi),
            };
            let summary = layout.emit(&catalog.cards, &mut sink)?;
            let (pdf, previews) = sink.finish()?;
            (pdf, previews, summary)
        }
        None => {
            let mut sink = pdf;
            let summary = layout.emit(&catalog.cards, &mut sink)?;
            (sink.finish()?, Vec::new(), summary)
        }
    };

    let fingerprint = batch_fingerprint(catalog, options);
    log::info!(
        "laid out {} card(s) on {} page pair(s), fingerprint {}",
        summary.cards,
        summary.batch_pages,
        &fingerprint[..12]
    );
    Ok(RenderedBatch {
        pdf,
        previews,
        summary,
        fingerprint,
    })
}

/// SHA-256 over the ordered cards and every setting that affects the output.
pub fn batch_fingerprint(catalog: &Catalog, options: &TokenOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(catalog.fingerprint().as_bytes());
    hasher.update(format!("{:?}", options.layout).as_bytes());
    hasher.update(options.base_url.as_bytes());
    hasher.update([options.tiled_codes as u8]);
    format!("{:x}", hasher.finalize())
}

/// Write `bytes` to a file that must not exist yet.
///
/// A partially written file is removed again if the write fails.
pub fn write_new_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    if let Err(err) = file.write_all(bytes).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(err).with_context(|| format!("failed to write {}", path.display()));
    }
    Ok(())
}
