//! # Page Geometry
//!
//! Resolves a [`LayoutConfig`] into concrete point dimensions and a grid
//! size. The grid is uniform: every page of an export has the same number
//! of columns and rows.

use serde::Serialize;

use crate::error::ConfigError;
use crate::model::LayoutConfig;

/// Points per centimeter (1 inch = 72 points = 2.54 cm).
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// Slack for floating point error when a whole number of boxes fits exactly.
const FIT_EPSILON: f64 = 1e-6;

/// Upper bound on cells per page. Keeps `columns * rows` well inside `usize`.
pub const MAX_CELLS_PER_PAGE: u64 = 1_000_000;

/// Convert centimeters to points.
#[inline]
pub fn cm_to_pt(cm: f64) -> f64 {
    cm * POINTS_PER_CM
}

/// Grid geometry shared by every page of an export. All lengths in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub box_width: f64,
    pub box_height: f64,
    pub gap: f64,
    pub usable_width: f64,
    pub usable_height: f64,
    pub columns: usize,
    pub rows: usize,
}

impl PageGeometry {
    /// Maximum number of images per page.
    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    /// Horizontal distance between the left edges of adjacent cells.
    pub fn column_pitch(&self) -> f64 {
        self.box_width + self.gap
    }

    /// Vertical distance between the top edges of adjacent cells.
    pub fn row_pitch(&self) -> f64 {
        self.box_height + self.gap
    }
}

/// Resolve page size, usable area and grid dimensions for a config.
///
/// N boxes need N-1 gaps, so one extra gap of slack is added to the usable
/// length before dividing by the pitch.
pub fn resolve_page_geometry(config: &LayoutConfig) -> Result<PageGeometry, ConfigError> {
    config.validate()?;

    let (page_width, page_height) = config
        .orientation
        .apply(config.page_format.dimensions());

    let margin = cm_to_pt(config.margin);
    let box_width = cm_to_pt(config.box_width);
    let box_height = cm_to_pt(config.box_height);
    let gap = cm_to_pt(config.gap);

    let usable_width = page_width - 2.0 * margin;
    let usable_height = page_height - 2.0 * margin;

    let columns = ((usable_width + gap) / (box_width + gap) + FIT_EPSILON).floor();
    let rows = ((usable_height + gap) / (box_height + gap) + FIT_EPSILON).floor();

    if columns < 1.0 || rows < 1.0 {
        return Err(ConfigError::BoxTooLarge {
            columns: columns.max(0.0) as i64,
            rows: rows.max(0.0) as i64,
        });
    }

    if columns * rows > MAX_CELLS_PER_PAGE as f64 {
        return Err(ConfigError::TooManyCells {
            columns: columns as u64,
            rows: rows as u64,
            limit: MAX_CELLS_PER_PAGE,
        });
    }

    Ok(PageGeometry {
        page_width,
        page_height,
        margin,
        box_width,
        box_height,
        gap,
        usable_width,
        usable_height,
        columns: columns as usize,
        rows: rows as usize,
    })
}
