// Seelevel Decode - History plotter for Seelevel tank sensors
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # seelevel-decode
//!
//! Decodes the segment data of Seelevel tank sensors recorded by Home
//! Assistant and plots the decoded levels as text.
//!
//! ## Usage
//!
//! ```bash
//! # Configure ESPHome with a seelevel sensor and enable segment_data,
//! # download the entities from the History tab as CSV, then:
//! seelevel-decode history.csv
//!
//! # Show skipped rows and collation details
//! RUST_LOG=debug seelevel-decode history.csv
//! ```
//!
//! You may need to widen the terminal to view the chart without wrapping.
//! Decoder selection and chart settings are edited in the source between
//! experiments, not passed as flags.

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use seelevel::{Pipeline, PipelineConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Plot decoded Seelevel tank levels from a history export
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// History CSV exported from Home Assistant (entity_id,state,last_changed)
    history: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr, the chart owns stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!("seelevel-decode v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> seelevel::Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::default())?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = pipeline.run_path(&args.history, &mut out)?;

    if !summary.skipped.is_empty() {
        warn!(
            "Skipped {} of {} rows in {}",
            summary.skipped.len(),
            summary.rows,
            args.history.display()
        );
    }
    Ok(())
}
