//! Page grid geometry.
//!
//! All lengths are millimetres with the origin at the bottom-left corner of the
//! page, matching PDF user space.

use std::fmt;

use thiserror::Error;

/// Points per millimetre (1 pt = 1/72 in).
pub const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("{0}")]
    InvalidConfig(String),
    #[error(
        "a {card_size}mm card with a {min_margin}mm margin does not fit on {paper} paper \
         ({columns} column(s) x {rows} row(s))"
    )]
    NoRoom {
        paper: Paper,
        card_size: f32,
        min_margin: f32,
        columns: usize,
        rows: usize,
    },
    #[error("page capacity must be at least one card")]
    ZeroCapacity,
}

/// Supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Paper {
    #[default]
    A4,
    A3,
    Letter,
}

impl Paper {
    /// (width, height) in millimetres, portrait.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            Paper::A4 => (210.0, 297.0),
            Paper::A3 => (297.0, 420.0),
            Paper::Letter => (215.9, 279.4),
        }
    }
}

impl fmt::Display for Paper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paper::A4 => write!(f, "A4"),
            Paper::A3 => write!(f, "A3"),
            Paper::Letter => write!(f, "Letter"),
        }
    }
}

/// Axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `amount` on every side.
    pub fn inset(&self, amount: f32) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            width: self.width - 2.0 * amount,
            height: self.height - 2.0 * amount,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// Column order within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

/// User-facing layout settings, validated before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub paper: Paper,
    pub card_size: f32,
    pub min_margin: f32,
    pub image_padding: f32,
    pub code_padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            card_size: 60.0,
            min_margin: 3.0,
            image_padding: 1.0,
            code_padding: 3.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !self.card_size.is_finite() || self.card_size <= 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "card size must be a positive length (got {}mm)",
                self.card_size
            )));
        }
        if !self.min_margin.is_finite() || self.min_margin < 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "margin must not be negative (got {}mm)",
                self.min_margin
            )));
        }
        for (label, padding) in [
            ("image padding", self.image_padding),
            ("code padding", self.code_padding),
        ] {
            if !padding.is_finite() || padding < 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{label} must not be negative (got {padding}mm)"
                )));
            }
            if self.card_size - 2.0 * padding <= 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{label} of {padding}mm leaves no room inside a {}mm card",
                    self.card_size
                )));
            }
        }
        Ok(())
    }
}

/// Centered uniform grid derived from a [`LayoutConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub paper_width: f32,
    pub paper_height: f32,
    pub card_size: f32,
    pub columns: usize,
    pub rows: usize,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl Grid {
    pub fn compute(config: &LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        let (paper_width, paper_height) = config.paper.dimensions();
        let columns = fit_count(paper_width, config.min_margin, config.card_size);
        let rows = fit_count(paper_height, config.min_margin, config.card_size);
        if columns == 0 || rows == 0 {
            return Err(LayoutError::NoRoom {
                paper: config.paper,
                card_size: config.card_size,
                min_margin: config.min_margin,
                columns,
                rows,
            });
        }
        let grid = Self {
            paper_width,
            paper_height,
            card_size: config.card_size,
            columns,
            rows,
            margin_x: (paper_width - columns as f32 * config.card_size) / 2.0,
            margin_y: (paper_height - rows as f32 * config.card_size) / 2.0,
        };
        log::debug!(
            "grid on {}: {}x{} cells of {}mm, margins {:.2}mm x {:.2}mm",
            config.paper,
            grid.columns,
            grid.rows,
            grid.card_size,
            grid.margin_x,
            grid.margin_y
        );
        Ok(grid)
    }

    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    /// Bounds of the cell at `row` (0 = top) and scan position `step` within the row.
    ///
    /// `step` counts in placement order, so step 0 of a right-to-left pass is the
    /// rightmost column.
    pub fn cell(&self, row: usize, step: usize, direction: Direction) -> Rect {
        let y = self.paper_height - self.card_size - self.margin_y - row as f32 * self.card_size;
        let x = match direction {
            Direction::LeftToRight => self.margin_x + step as f32 * self.card_size,
            Direction::RightToLeft => {
                self.paper_width - self.margin_x - self.card_size - step as f32 * self.card_size
            }
        };
        Rect::new(x, y, self.card_size, self.card_size)
    }

    /// Physical column index (0 = leftmost) for a scan step.
    pub fn column(&self, step: usize, direction: Direction) -> usize {
        match direction {
            Direction::LeftToRight => step,
            Direction::RightToLeft => self.columns - 1 - step,
        }
    }
}

fn fit_count(extent: f32, min_margin: f32, card_size: f32) -> usize {
    let usable = extent - 2.0 * min_margin;
    if usable <= 0.0 {
        return 0;
    }
    (usable / card_size).floor() as usize
}
