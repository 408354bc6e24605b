//! Command-line argument definitions.
//!
//! Layout flags override values from `--config` and `--request`, which in
//! turn override the built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::model::{FitMode, Orientation, PageFormat};

/// Tile images into a fixed-size grid across printable PDF pages
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Image files to place, in order (.png, .jpg, .jpeg; others are skipped)
    pub images: Vec<PathBuf>,

    /// Path to the output PDF file
    #[arg(short, long, default_value = "grid.pdf")]
    pub output: PathBuf,

    /// JSON export request with config, images and metadata
    #[arg(short, long)]
    pub request: Option<PathBuf>,

    /// JSON layout config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Page format (a4, a3, a5, letter, legal)
    #[arg(long)]
    pub page_format: Option<PageFormat>,

    /// Page orientation (portrait, landscape)
    #[arg(long)]
    pub orientation: Option<Orientation>,

    /// Box width in centimeters
    #[arg(long)]
    pub box_width: Option<f64>,

    /// Box height in centimeters
    #[arg(long)]
    pub box_height: Option<f64>,

    /// Gap between boxes in centimeters
    #[arg(long)]
    pub gap: Option<f64>,

    /// Page margin in centimeters
    #[arg(long)]
    pub margin: Option<f64>,

    /// How images fill their box (contain, cover)
    #[arg(long)]
    pub fit: Option<FitMode>,

    /// Do not draw cell outlines
    #[arg(long)]
    pub no_outline: bool,

    /// Let cover-fitted images spill past their cell
    #[arg(long)]
    pub no_clip: bool,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// Print the computed layout as JSON to stdout
    #[arg(long)]
    pub layout_json: bool,

    /// Print an example request and exit
    #[arg(long)]
    pub example: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
