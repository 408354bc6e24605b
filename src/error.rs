//! Structured error types for gridprint.
//!
//! Configuration problems are kept in their own [`ConfigError`] so the
//! layout engine can stay free of I/O and decoding concerns. Everything the
//! public API returns is a [`GridError`].

use std::path::PathBuf;

use thiserror::Error;

/// A layout configuration that cannot produce a grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A box dimension is zero, negative, or not a finite number.
    #[error("{field} must be a positive number of centimeters, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// Gap or margin is negative or not a finite number.
    #[error("{field} must be zero or a positive number of centimeters, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// Not even a single box fits inside the usable page area.
    #[error("box too large for page ({columns} columns x {rows} rows fit)")]
    BoxTooLarge { columns: i64, rows: i64 },

    /// The box is so small that the page would hold an absurd number of cells.
    #[error("box too small: {columns} columns x {rows} rows exceeds {limit} cells per page")]
    TooManyCells { columns: u64, rows: u64, limit: u64 },
}

/// The unified error type returned by all public gridprint functions.
#[derive(Debug, Error)]
pub enum GridError {
    /// The layout configuration was rejected before any page was produced.
    #[error("Invalid layout: {0}")]
    Config(#[from] ConfigError),

    /// JSON input failed to parse as an export request or layout config.
    #[error("Failed to parse request: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// A supported image could not be read or decoded.
    #[error("Image '{name}': {message}")]
    Image { name: String, message: String },

    /// The computed layout could not be written out as JSON.
    #[error("Failed to serialize layout: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Reading an input or writing the output failed.
    #[error("Failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl GridError {
    pub(crate) fn image(name: &str, message: impl Into<String>) -> Self {
        GridError::Image {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for GridError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the request schema. Check field names and enum values (e.g. \"A4\", \"Landscape\", \"Cover\").".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        GridError::Parse { source: e, hint }
    }
}
