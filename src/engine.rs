//! Places cards onto page pairs: an artwork pass followed by a mirrored code pass.

use anyhow::{Context, Result};

use crate::catalog::Card;
use crate::faces::FaceSource;
use crate::geometry::{Direction, Grid, LayoutConfig, LayoutError, PT_PER_MM, Rect};
use crate::pagination::paginate;
use crate::sink::PageSink;

/// Distance from a cell's bottom edge to the label baseline, in points.
pub const LABEL_OFFSET_PT: f32 = 10.0;

/// Presentation of one pass over a page of cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStyle {
    pub direction: Direction,
    pub frame: bool,
    pub label: bool,
    pub padding: f32,
}

impl PassStyle {
    /// Front faces: framed artwork with the identifier underneath.
    pub fn image(padding: f32) -> Self {
        Self {
            direction: Direction::LeftToRight,
            frame: true,
            label: true,
            padding,
        }
    }

    /// Back faces: bare codes, columns mirrored so they register when flipped.
    pub fn code(padding: f32) -> Self {
        Self {
            direction: Direction::RightToLeft,
            frame: false,
            label: false,
            padding,
        }
    }
}

/// A pass style together with the raster source it draws from.
#[derive(Clone, Copy)]
pub struct Pass<'a> {
    pub name: &'static str,
    pub style: PassStyle,
    pub source: &'a dyn FaceSource,
}

/// Where one card lands during a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index into the page's card slice.
    pub card: usize,
    pub row: usize,
    /// Physical column, 0 = leftmost.
    pub column: usize,
    pub cell: Rect,
    pub content: Rect,
    /// (center x, baseline y) of the identifier label.
    pub label: Option<(f32, f32)>,
}

/// Compute the placements of the first `min(card_count, capacity)` cards.
///
/// Cells are visited top row first; within a row the pass direction decides
/// whether scanning starts at the left or the right edge.
pub fn plan_pass(grid: &Grid, card_count: usize, style: &PassStyle) -> Vec<Placement> {
    let placed = card_count.min(grid.capacity());
    let label_offset = LABEL_OFFSET_PT / PT_PER_MM;
    (0..placed)
        .map(|idx| {
            let row = idx / grid.columns;
            let step = idx % grid.columns;
            let cell = grid.cell(row, step, style.direction);
            Placement {
                card: idx,
                row,
                column: grid.column(step, style.direction),
                cell,
                content: cell.inset(style.padding),
                label: style
                    .label
                    .then(|| (cell.center_x(), cell.y + label_offset)),
            }
        })
        .collect()
}

/// Counts reported after a batch has been laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    pub cards: usize,
    pub columns: usize,
    pub rows: usize,
    pub batch_pages: usize,
    pub document_pages: usize,
}

/// The layout engine: one grid, two face sources.
pub struct TokenLayout<'a> {
    grid: Grid,
    image_pass: Pass<'a>,
    code_pass: Pass<'a>,
}

impl<'a> TokenLayout<'a> {
    pub fn new(
        config: &LayoutConfig,
        artwork: &'a dyn FaceSource,
        codes: &'a dyn FaceSource,
    ) -> Result<Self, LayoutError> {
        let grid = Grid::compute(config)?;
        Ok(Self {
            grid,
            image_pass: Pass {
                name: "image",
                style: PassStyle::image(config.image_padding),
                source: artwork,
            },
            code_pass: Pass {
                name: "code",
                style: PassStyle::code(config.code_padding),
                source: codes,
            },
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Emit every page pair for `cards` into `sink`. The sink is not finished.
    pub fn emit<S: PageSink>(&self, cards: &[Card], sink: &mut S) -> Result<LayoutSummary> {
        let pages = paginate(cards, self.grid.capacity())?;
        for (page_idx, page) in pages.iter().enumerate() {
            log::debug!(
                "page pair {}/{}: {} card(s)",
                page_idx + 1,
                pages.len(),
                page.len()
            );
            for pass in [&self.image_pass, &self.code_pass] {
                self.emit_pass(page, pass, sink).with_context(|| {
                    format!("failed to lay out {} pass of page {}", pass.name, page_idx + 1)
                })?;
            }
        }
        Ok(LayoutSummary {
            cards: cards.len(),
            columns: self.grid.columns,
            rows: self.grid.rows,
            batch_pages: pages.len(),
            document_pages: pages.len() * 2,
        })
    }

    fn emit_pass<S: PageSink>(&self, cards: &[Card], pass: &Pass<'_>, sink: &mut S) -> Result<()> {
        sink.begin_page()?;
        for placement in plan_pass(&self.grid, cards.len(), &pass.style) {
            let card = &cards[placement.card];
            log::trace!(
                "{} pass: '{}' at row {} column {}",
                pass.name,
                card.identifier,
                placement.row,
                placement.column
            );
            if pass.style.frame {
                sink.draw_rect(placement.cell)?;
            }
            let raster = pass.source.render(card)?;
            sink.draw_raster(&raster, placement.content)?;
            if let Some((center_x, baseline_y)) = placement.label {
                sink.draw_centered_text(&card.identifier, center_x, baseline_y)?;
            }
        }
        sink.end_page()?;
        Ok(())
    }
}
