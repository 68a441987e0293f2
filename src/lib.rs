//! Printable token sheets: artwork fronts and mirrored QR-code backs laid out
//! on a uniform grid for duplex printing.

mod catalog;
mod engine;
mod faces;
mod geometry;
mod pagination;
mod sink;
mod tokens;

pub use catalog::{Card, Catalog, CatalogError};
pub use engine::{LABEL_OFFSET_PT, LayoutSummary, Pass, PassStyle, Placement, TokenLayout, plan_pass};
pub use faces::{ArtworkLoader, CodeRenderer, DEFAULT_BASE_URL, FaceError, FaceSource};
pub use geometry::{Direction, Grid, LayoutConfig, LayoutError, PT_PER_MM, Paper, Rect};
pub use pagination::{page_count, paginate};
pub use sink::{
    LABEL_FONT_SIZE, PageSink, PdfSink, RasterSink, SinkError, TeeSink, helvetica_width_pt,
    save_previews,
};
pub use tokens::{RenderedBatch, TokenOptions, batch_fingerprint, render_batch, write_new_file};
