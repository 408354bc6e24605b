//! CLI logic for gridprint.
//!
//! Builds an [`ExportRequest`] from a request file, a config file, image
//! paths and flags, exports it, and writes the PDF.

mod args;

pub use args::Args;

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::GridError;
use crate::layout::GridLayoutEngine;
use crate::model::{ExportRequest, ImageEntry, ImageKind, LayoutConfig};
use crate::{export, image_loader, GridExport};

/// What a successful run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub export: GridExport,
}

/// Run the gridprint CLI.
///
/// # Errors
///
/// Returns `GridError` for:
/// - File I/O errors
/// - Request or config parsing errors
/// - Layout configuration errors (box too large, invalid values)
/// - Image decoding errors
pub fn run(args: &Args) -> Result<RunSummary, GridError> {
    let mut request = match &args.request {
        Some(path) => serde_json::from_slice::<ExportRequest>(&read(path)?)?,
        None => ExportRequest::default(),
    };

    if let Some(path) = &args.config {
        request.config = load_config(path)?;
    }
    apply_overrides(&mut request.config, args);
    if let Some(title) = &args.title {
        request.metadata.title = Some(title.clone());
    }

    // Fail on the layout before touching any image file.
    GridLayoutEngine::new(&request.config)?;

    info!(
        images = request.images.len() + args.images.len(),
        output = args.output.display().to_string();
        "Exporting grid"
    );

    let mut entries = image_loader::resolve_sources(&request.images)?;
    for path in &args.images {
        entries.push(read_entry(path)?);
    }

    let export = export(&entries, &request.config, &request.metadata)?;

    if args.layout_json {
        let layout =
            serde_json::to_string_pretty(&export.pages).map_err(GridError::Serialize)?;
        println!("{}", layout);
    }

    fs::write(&args.output, &export.pdf).map_err(|source| GridError::Io {
        path: args.output.clone(),
        source,
    })?;

    info!(output = args.output.display().to_string(); "PDF written");

    Ok(RunSummary {
        output: args.output.clone(),
        export,
    })
}

/// Load a JSON layout config file.
pub fn load_config(path: &Path) -> Result<LayoutConfig, GridError> {
    let config: LayoutConfig = serde_json::from_slice(&read(path)?)?;
    Ok(config)
}

/// Apply layout flags on top of `config`.
pub fn apply_overrides(config: &mut LayoutConfig, args: &Args) {
    if let Some(format) = args.page_format {
        config.page_format = format;
    }
    if let Some(orientation) = args.orientation {
        config.orientation = orientation;
    }
    if let Some(w) = args.box_width {
        config.box_width = w;
    }
    if let Some(h) = args.box_height {
        config.box_height = h;
    }
    if let Some(gap) = args.gap {
        config.gap = gap;
    }
    if let Some(margin) = args.margin {
        config.margin = margin;
    }
    if let Some(fit) = args.fit {
        config.fit_mode = fit;
    }
    if args.no_outline {
        config.outline = false;
    }
    if args.no_clip {
        config.clip_overflow = false;
    }
}

/// Read an image path. Files that will be skipped are not opened.
fn read_entry(path: &Path) -> Result<ImageEntry, GridError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let data = match ImageKind::from_filename(&name) {
        Some(_) => read(path)?,
        None => Vec::new(),
    };
    Ok(ImageEntry::new(name, data))
}

fn read(path: &Path) -> Result<Vec<u8>, GridError> {
    fs::read(path).map_err(|source| GridError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// An example request, printed by `--example`.
pub fn example_request_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Contact Sheet",
    "author": "gridprint"
  },
  "config": {
    "pageFormat": "A4",
    "orientation": "Portrait",
    "boxWidth": 8,
    "boxHeight": 8,
    "gap": 0.5,
    "margin": 1.5,
    "fitMode": "Cover",
    "outline": true,
    "clipOverflow": true
  },
  "images": [
    { "name": "first.jpg", "src": "./photos/first.jpg" },
    { "name": "second.png", "src": "./photos/second.png" },
    { "name": "pixel.png", "src": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==" }
  ]
}
"##
}
