//! # Grid Layout Engine
//!
//! Turns an ordered list of images into pages of fixed-size cells.
//!
//! The algorithm is small and has three separate steps:
//!
//! 1. [`geometry`] resolves page size and how many columns and rows fit.
//!    If not even one box fits, the export fails here, before any page
//!    exists.
//! 2. [`paginate`] chunks the images into pages of `columns × rows`,
//!    strictly in input order.
//! 3. [`fit`] scales each image into its cell (contain or cover) and
//!    centres it.
//!
//! Coordinates are PDF user space: points, origin at the bottom-left of the
//! page. Row 0 is the top row of cells, so it has the largest `y`.
//!
//! The engine is pure. It keeps no state between calls and reads nothing
//! but its arguments, so independent exports can run concurrently.

pub mod fit;
pub mod geometry;
pub mod paginate;

use log::debug;
use serde::Serialize;

use crate::error::ConfigError;
use crate::model::{FitMode, ImageKind, LayoutConfig};

pub use fit::{place_in_cell, CellFit, CELL_INSET};
pub use geometry::{resolve_page_geometry, PageGeometry};
pub use paginate::partition_into_pages;

/// What the layout needs to know about one input image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDescriptor {
    /// Position of the image in the caller's input list.
    pub source_index: usize,
    /// `None` for files that are neither PNG nor JPEG. Those are skipped.
    pub kind: Option<ImageKind>,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageDescriptor {
    pub fn new(source_index: usize, kind: ImageKind, width_px: u32, height_px: u32) -> Self {
        Self {
            source_index,
            kind: Some(kind),
            width_px,
            height_px,
        }
    }

    /// A descriptor for an input that will not be placed.
    pub fn unsupported(source_index: usize) -> Self {
        Self {
            source_index,
            kind: None,
            width_px: 0,
            height_px: 0,
        }
    }
}

/// An axis-aligned rectangle in points. `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `d` on every side.
    pub fn inset(&self, d: f64) -> Self {
        Self::new(
            self.x + d,
            self.y + d,
            (self.width - 2.0 * d).max(0.0),
            (self.height - 2.0 * d).max(0.0),
        )
    }

    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-6;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.x + other.width <= self.x + self.width + EPS
            && other.y + other.height <= self.y + self.height + EPS
    }
}

/// Where one image lands on a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub page_index: usize,
    /// Cell number on the page, counted row by row from the top left.
    pub slot: usize,
    pub column: usize,
    pub row: usize,
    pub source_index: usize,
    /// The full cell, used for the outline.
    pub cell: Rect,
    /// The drawn image in page coordinates. Under cover it extends past
    /// `cell` on one axis.
    pub image: Rect,
    /// Drawn image offset from the cell's bottom-left corner.
    pub offset_x: f64,
    pub offset_y: f64,
}

/// One laid-out page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPage {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub placements: Vec<Placement>,
}

/// Grid layout for a single validated configuration.
#[derive(Debug, Clone)]
pub struct GridLayoutEngine {
    geometry: PageGeometry,
    fit_mode: FitMode,
}

impl GridLayoutEngine {
    /// Resolve the page geometry for `config`, failing if no box fits.
    pub fn new(config: &LayoutConfig) -> Result<Self, ConfigError> {
        let geometry = resolve_page_geometry(config)?;
        debug!(
            columns = geometry.columns,
            rows = geometry.rows,
            page_width = geometry.page_width,
            page_height = geometry.page_height;
            "Resolved page geometry"
        );
        Ok(Self {
            geometry,
            fit_mode: config.fit_mode,
        })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Bottom-left anchored cell rectangle for a column and row.
    pub fn cell_rect(&self, column: usize, row: usize) -> Rect {
        let g = &self.geometry;
        let x = g.margin + column as f64 * g.column_pitch();
        let y_top = g.page_height - g.margin - row as f64 * g.row_pitch();
        Rect::new(x, y_top - g.box_height, g.box_width, g.box_height)
    }

    /// Lay out one page worth of images.
    pub fn layout_page(&self, page_index: usize, images: &[&ImageDescriptor]) -> LayoutPage {
        let g = &self.geometry;
        let placements = images
            .iter()
            .enumerate()
            .map(|(slot, image)| {
                let (column, row) = paginate::cell_position(slot, g.columns);
                let cell = self.cell_rect(column, row);
                let fit = place_in_cell(
                    image.width_px,
                    image.height_px,
                    cell.width,
                    cell.height,
                    self.fit_mode,
                );
                Placement {
                    page_index,
                    slot,
                    column,
                    row,
                    source_index: image.source_index,
                    cell,
                    image: Rect::new(
                        cell.x + fit.offset_x,
                        cell.y + fit.offset_y,
                        fit.width,
                        fit.height,
                    ),
                    offset_x: fit.offset_x,
                    offset_y: fit.offset_y,
                }
            })
            .collect();

        LayoutPage {
            index: page_index,
            width: g.page_width,
            height: g.page_height,
            placements,
        }
    }

    /// Lazily lay out `images`, one page per iteration.
    ///
    /// Images without a supported kind are dropped before chunking, so they
    /// never take up a cell.
    pub fn pages<'a>(
        &'a self,
        images: &'a [ImageDescriptor],
    ) -> impl Iterator<Item = LayoutPage> + 'a {
        let placeable: Vec<&ImageDescriptor> =
            images.iter().filter(|img| img.kind.is_some()).collect();
        let capacity = self.geometry.capacity();
        let slices: Vec<Vec<&ImageDescriptor>> = partition_into_pages(&placeable, capacity)
            .into_iter()
            .map(|slice| slice.to_vec())
            .collect();

        slices
            .into_iter()
            .enumerate()
            .map(move |(page_index, slice)| self.layout_page(page_index, &slice))
    }
}

/// Lay out all `images` under `config`.
///
/// Fails with [`ConfigError`] before producing anything if the box does
/// not fit on the page.
pub fn layout_images(
    images: &[ImageDescriptor],
    config: &LayoutConfig,
) -> Result<Vec<LayoutPage>, ConfigError> {
    let engine = GridLayoutEngine::new(config)?;
    Ok(engine.pages(images).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squares(n: usize) -> Vec<ImageDescriptor> {
        (0..n)
            .map(|i| ImageDescriptor::new(i, ImageKind::Png, 100, 100))
            .collect()
    }

    #[test]
    fn test_reference_scenario_pages() {
        let pages = layout_images(&squares(14), &LayoutConfig::default()).unwrap();
        let lens: Vec<usize> = pages.iter().map(|p| p.placements.len()).collect();
        assert_eq!(lens, vec![6, 6, 2]);
        assert_eq!(pages[2].placements[1].source_index, 13);
        assert_eq!(pages[1].index, 1);
    }

    #[test]
    fn test_first_cell_is_top_left() {
        let pages = layout_images(&squares(1), &LayoutConfig::default()).unwrap();
        let p = &pages[0].placements[0];
        let margin = geometry::cm_to_pt(1.5);
        let box_pt = geometry::cm_to_pt(8.0);
        assert!((p.cell.x - margin).abs() < 1e-9);
        assert!((p.cell.y - (841.89 - margin - box_pt)).abs() < 1e-9);
        assert!((p.cell.width - box_pt).abs() < 1e-9);
    }

    #[test]
    fn test_rows_descend_and_columns_advance() {
        let pages = layout_images(&squares(6), &LayoutConfig::default()).unwrap();
        let ps = &pages[0].placements;
        let pitch = geometry::cm_to_pt(8.5);

        assert_eq!((ps[1].column, ps[1].row), (1, 0));
        assert!((ps[1].cell.x - ps[0].cell.x - pitch).abs() < 1e-9);
        assert!((ps[1].cell.y - ps[0].cell.y).abs() < 1e-9);

        assert_eq!((ps[2].column, ps[2].row), (0, 1));
        assert!((ps[0].cell.y - ps[2].cell.y - pitch).abs() < 1e-9);

        assert_eq!((ps[5].column, ps[5].row), (1, 2));
    }

    #[test]
    fn test_all_cells_inside_margins() {
        let config = LayoutConfig::default();
        let pages = layout_images(&squares(6), &config).unwrap();
        let m = geometry::cm_to_pt(config.margin);
        let page = &pages[0];
        let usable = Rect::new(m, m, page.width - 2.0 * m, page.height - 2.0 * m);
        for p in &page.placements {
            assert!(usable.contains(&p.cell), "{:?}", p.cell);
            assert!(p.cell.contains(&p.image));
        }
    }

    #[test]
    fn test_unsupported_entries_take_no_cell() {
        let mut images = squares(5);
        images.insert(2, ImageDescriptor::unsupported(99));
        let pages = layout_images(&images, &LayoutConfig::default()).unwrap();
        assert_eq!(pages.len(), 1);
        let placed: Vec<usize> = pages[0].placements.iter().map(|p| p.source_index).collect();
        assert_eq!(placed, vec![0, 1, 3, 4, 5]);
        assert_eq!(pages[0].placements[2].slot, 2);
    }

    #[test]
    fn test_config_error_produces_no_pages() {
        let config = LayoutConfig {
            box_width: 30.0,
            ..Default::default()
        };
        let result = layout_images(&squares(3), &config);
        assert!(matches!(result, Err(ConfigError::BoxTooLarge { .. })));
    }

    #[test]
    fn test_no_images_no_pages() {
        let pages = layout_images(&[], &LayoutConfig::default()).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn test_cover_image_is_centred_on_cell() {
        let config = LayoutConfig {
            fit_mode: FitMode::Cover,
            ..Default::default()
        };
        let images = [ImageDescriptor::new(0, ImageKind::Jpeg, 200, 100)];
        let pages = layout_images(&images, &config).unwrap();
        let p = &pages[0].placements[0];
        assert!(p.offset_x < 0.0);
        assert!(p.image.width > p.cell.width);
        let cell_cx = p.cell.x + p.cell.width / 2.0;
        let img_cx = p.image.x + p.image.width / 2.0;
        assert!((cell_cx - img_cx).abs() < 1e-9);
    }

    #[test]
    fn test_pages_iterator_is_lazy_and_matches_collect() {
        let engine = GridLayoutEngine::new(&LayoutConfig::default()).unwrap();
        let images = squares(13);
        let mut iter = engine.pages(&images);
        let first = iter.next().unwrap();
        assert_eq!(first.placements.len(), 6);
        assert_eq!(iter.count(), 2);
    }
}
