//! # gridprint CLI
//!
//! Usage:
//!   gridprint photos/*.jpg -o grid.pdf --box-width 6 --box-height 9 --fit cover
//!   gridprint --request request.json -o grid.pdf
//!   gridprint --example > request.json

use std::{process, str::FromStr};

use clap::Parser;
use log::{debug, info, LevelFilter};

use gridprint::cli::{self, Args};

fn main() {
    let args = Args::parse();

    if args.example {
        print!("{}", cli::example_request_json());
        return;
    }

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(args:?; "Parsed arguments");

    match cli::run(&args) {
        Ok(summary) => {
            info!(
                pages = summary.export.pages.len(),
                placed = summary.export.placed();
                "Completed successfully"
            );
            eprintln!(
                "✓ Placed {} image(s) on {} page(s), written to {}",
                summary.export.placed(),
                summary.export.pages.len(),
                summary.output.display()
            );
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(1);
        }
    }
}
