//! # Export Model
//!
//! The input representation for a grid export. A request is a layout
//! configuration plus an ordered list of images. Order is significant: it is
//! the order the user picked the files in, and the layout never changes it.
//!
//! All physical lengths in [`LayoutConfig`] are centimeters. The layout
//! engine converts them to points (1/72 inch) once, in
//! [`crate::layout::geometry`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A complete export request, as accepted by [`crate::render_json`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Grid and page configuration.
    #[serde(default)]
    pub config: LayoutConfig,

    /// Images in placement order.
    #[serde(default)]
    pub images: Vec<ImageSource>,

    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,
}

/// Grid configuration for one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page_format: PageFormat,
    pub orientation: Orientation,
    /// Width of every grid cell, in centimeters.
    pub box_width: f64,
    /// Height of every grid cell, in centimeters.
    pub box_height: f64,
    /// Spacing between adjacent cells on both axes, in centimeters.
    pub gap: f64,
    /// Uniform inset from each page edge to the grid, in centimeters.
    pub margin: f64,
    pub fit_mode: FitMode,
    /// Stroke the outline of every occupied cell.
    pub outline: bool,
    /// Clip cover-fitted images to their cell instead of letting them
    /// spill over neighbouring cells.
    pub clip_overflow: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            orientation: Orientation::Portrait,
            box_width: 8.0,
            box_height: 8.0,
            gap: 0.5,
            margin: 1.5,
            fit_mode: FitMode::Contain,
            outline: true,
            clip_overflow: true,
        }
    }
}

impl LayoutConfig {
    /// Reject values no grid can be built from.
    ///
    /// This only checks individual fields. Whether the box actually fits on
    /// the page is decided by [`crate::layout::resolve_page_geometry`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("boxWidth", self.box_width), ("boxHeight", self.box_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [("gap", self.gap), ("margin", self.margin)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Standard page formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    #[default]
    A4,
    A3,
    A5,
    #[serde(alias = "LETTER", alias = "letter")]
    Letter,
    #[serde(alias = "LEGAL", alias = "legal")]
    Legal,
}

impl PageFormat {
    /// Returns portrait (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (595.28, 841.89),
            PageFormat::A3 => (841.89, 1190.55),
            PageFormat::A5 => (419.53, 595.28),
            PageFormat::Letter => (612.0, 792.0),
            PageFormat::Legal => (612.0, 1008.0),
        }
    }
}

impl FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "a3" => Ok(PageFormat::A3),
            "a5" => Ok(PageFormat::A5),
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            other => Err(format!(
                "unknown page format '{}' (expected a4, a3, a5, letter or legal)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    #[serde(alias = "portrait")]
    Portrait,
    #[serde(alias = "landscape")]
    Landscape,
}

impl Orientation {
    /// Apply this orientation to portrait dimensions.
    pub fn apply(&self, (width, height): (f64, f64)) -> (f64, f64) {
        match self {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!(
                "unknown orientation '{}' (expected portrait or landscape)",
                other
            )),
        }
    }
}

/// How an image is scaled into its cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitMode {
    /// Scale to fit entirely inside the cell. May leave empty bands.
    #[default]
    #[serde(alias = "contain")]
    Contain,
    /// Scale to fill the cell. The excess extends past the cell on one axis.
    #[serde(alias = "cover")]
    Cover,
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contain" => Ok(FitMode::Contain),
            "cover" => Ok(FitMode::Cover),
            other => Err(format!("unknown fit mode '{}' (expected contain or cover)", other)),
        }
    }
}

/// Image formats that can be placed on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Derive the kind from a file name's extension, case-insensitively.
    ///
    /// Returns `None` for anything other than `.png`, `.jpg` and `.jpeg`.
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::Png => write!(f, "PNG"),
            ImageKind::Jpeg => write!(f, "JPEG"),
        }
    }
}

/// One input file: its name and raw bytes.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ImageEntry {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn kind(&self) -> Option<ImageKind> {
        ImageKind::from_filename(&self.name)
    }
}

/// An image reference inside a JSON request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSource {
    /// File name. Its extension decides whether the image is placed.
    pub name: String,
    /// A `data:image/...;base64,` URI, a file path, or raw base64.
    pub src: String,
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.subject.is_none()
    }
}
