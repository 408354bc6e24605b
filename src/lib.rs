//! # gridprint
//!
//! Tile a batch of images into a grid of fixed-size boxes and export the
//! result as a printable PDF.
//!
//! Every box on every page has the same size. The number of boxes per page
//! follows from the page format, orientation, margin and gap; images fill
//! them left to right, top to bottom, in the order they were given, and
//! spill onto new pages as needed. Each image is scaled into its box either
//! to fit entirely (contain) or to fill it (cover).
//!
//! ## Architecture
//!
//! ```text
//! Input (files / JSON request)
//!       ↓
//!   [model]         — LayoutConfig, image entries, validation
//!       ↓
//!   [layout]        — Page geometry, pagination, fit placement (pure)
//!       ↑
//!   [image_loader]  — Filter by extension, decode PNG / pass JPEG through
//!       ↓
//!   [pdf]           — Serialize pages to PDF bytes
//! ```
//!
//! Geometry is resolved before any image is decoded, so a box that does not
//! fit on the page fails fast and nothing is produced.

pub mod cli;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;

#[cfg(feature = "wasm")]
pub mod wasm;

use log::info;

pub use error::{ConfigError, GridError};
pub use model::{ExportRequest, FitMode, ImageEntry, LayoutConfig, Metadata, Orientation, PageFormat};

use layout::{GridLayoutEngine, LayoutPage};
use pdf::PdfWriter;

/// The result of a successful export.
#[derive(Debug, Clone)]
pub struct GridExport {
    /// The finished PDF.
    pub pdf: Vec<u8>,
    /// The layout that was drawn.
    pub pages: Vec<LayoutPage>,
    /// Names of inputs that were not PNG or JPEG and were left out.
    pub skipped: Vec<String>,
}

impl GridExport {
    pub fn placed(&self) -> usize {
        self.pages.iter().map(|p| p.placements.len()).sum()
    }
}

/// Render `images` into a grid PDF.
///
/// This is the primary entry point. Inputs whose names are not `.png`,
/// `.jpg` or `.jpeg` are skipped. Fails with [`GridError::Config`] if not
/// even one box fits on the page.
pub fn generate_grid_document(
    images: &[ImageEntry],
    config: &LayoutConfig,
) -> Result<Vec<u8>, GridError> {
    export(images, config, &Metadata::default()).map(|export| export.pdf)
}

/// Render `images` into a grid PDF and return the layout alongside it.
pub fn export(
    images: &[ImageEntry],
    config: &LayoutConfig,
    metadata: &Metadata,
) -> Result<GridExport, GridError> {
    let engine = GridLayoutEngine::new(config)?;

    let batch = image_loader::load_supported(images)?;
    let descriptors = batch.descriptors();
    let pages: Vec<LayoutPage> = engine.pages(&descriptors).collect();

    let pdf = PdfWriter::from_config(config).write(&pages, &batch.images, metadata);

    let export = GridExport {
        pdf,
        pages,
        skipped: batch.skipped,
    };
    info!(
        pages = export.pages.len(),
        placed = export.placed(),
        skipped = export.skipped.len(),
        bytes = export.pdf.len();
        "Grid export complete"
    );
    Ok(export)
}

/// Render an export request described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, GridError> {
    let request: ExportRequest = serde_json::from_str(json)?;
    export_request(&request).map(|export| export.pdf)
}

/// Resolve the image sources of a parsed request and export it.
pub fn export_request(request: &ExportRequest) -> Result<GridExport, GridError> {
    // Validate before touching any image source.
    GridLayoutEngine::new(&request.config)?;

    let entries = image_loader::resolve_sources(&request.images)?;
    export(&entries, &request.config, &request.metadata)
}
