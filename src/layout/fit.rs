//! # Fit Placement
//!
//! Scales an image into a cell while preserving its aspect ratio.
//!
//! - **Contain** fits the whole image inside the cell. One axis matches the
//!   cell, the other leaves an empty band on both sides.
//! - **Cover** fills the cell. One axis matches the cell, the other extends
//!   past it by the same amount on both sides, giving negative offsets.
//!
//! Offsets are always measured from the cell's bottom-left corner and
//! centre the drawn image on the cell.

use serde::Serialize;

use crate::model::FitMode;

/// Inset applied on every side of a cell before fitting, so the image never
/// covers the cell outline.
pub const CELL_INSET: f64 = 1.0;

/// Drawn size and offset of an image inside a cell, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFit {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Fit an image with aspect ratio `aspect` (width / height) into a
/// `width` × `height` area.
pub fn fit_image(aspect: f64, width: f64, height: f64, mode: FitMode) -> CellFit {
    let cell_aspect = width / height;
    let wider = aspect > cell_aspect;

    // Contain pins the relatively longer axis, cover pins the shorter one.
    let pin_width = match mode {
        FitMode::Contain => wider,
        FitMode::Cover => !wider,
    };

    let (drawn_w, drawn_h) = if pin_width {
        (width, width / aspect)
    } else {
        (height * aspect, height)
    };

    CellFit {
        width: drawn_w,
        height: drawn_h,
        offset_x: (width - drawn_w) / 2.0,
        offset_y: (height - drawn_h) / 2.0,
    }
}

/// Aspect ratio of an image from its pixel size.
///
/// Degenerate sizes are treated as square rather than producing an
/// infinite or NaN rectangle.
pub fn aspect_ratio(width_px: u32, height_px: u32) -> f64 {
    if width_px == 0 || height_px == 0 {
        1.0
    } else {
        width_px as f64 / height_px as f64
    }
}

/// Fit an image into a full cell, leaving [`CELL_INSET`] free on every side.
///
/// The returned offsets are relative to the full cell, so they still centre
/// the image on it.
pub fn place_in_cell(
    width_px: u32,
    height_px: u32,
    cell_width: f64,
    cell_height: f64,
    mode: FitMode,
) -> CellFit {
    let inner_w = (cell_width - 2.0 * CELL_INSET).max(0.0);
    let inner_h = (cell_height - 2.0 * CELL_INSET).max(0.0);
    if inner_w <= 0.0 || inner_h <= 0.0 {
        return CellFit {
            width: 0.0,
            height: 0.0,
            offset_x: cell_width / 2.0,
            offset_y: cell_height / 2.0,
        };
    }

    let fit = fit_image(aspect_ratio(width_px, height_px), inner_w, inner_h, mode);
    CellFit {
        offset_x: fit.offset_x + (cell_width - inner_w) / 2.0,
        offset_y: fit.offset_y + (cell_height - inner_h) / 2.0,
        ..fit
    }
}
