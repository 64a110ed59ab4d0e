//! # Correlation Heatmap Pipeline
//!
//! Load the survey extract, keep the numeric features, compute their pairwise
//! Pearson correlation and draw the lower triangle to a PNG.
//!
//! The stages are split so each can be exercised on its own:
//!
//! 1. [`frame`] turns the CSV into a dense numeric matrix (missing = NaN).
//! 2. [`correlation`] computes the pairwise-complete Pearson matrix.
//! 3. [`layout`] decides what goes on the figure (pure, no drawing).
//! 4. [`render`] rasterises the layout with `plotters`.

pub mod correlation;
pub mod frame;
pub mod layout;
pub mod render;

use crate::config::HeatmapConfig;
use correlation::CorrelationMatrix;
use layout::HeatmapLayout;
use log::info;
use polars::prelude::PolarsError;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("CSV file not found at: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("No numeric columns found in the CSV after dropping fully-missing columns.")]
    NoNumericColumns,
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    Polars(#[from] PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render heatmap to '{}': {reason}", path.display())]
    Render { path: PathBuf, reason: String },
}

/// What a completed heatmap run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapSummary {
    pub n_features: usize,
    pub output_path: PathBuf,
    pub annotated: bool,
}

/// Loads `input` and computes the correlation matrix of its numeric columns.
pub fn compute_correlation(input: &Path) -> Result<CorrelationMatrix, HeatmapError> {
    let frame = frame::load_numeric_frame(input)?;
    info!(
        "Numeric frame has {} rows and {} features",
        frame.n_rows(),
        frame.n_features()
    );
    Ok(CorrelationMatrix::from_frame(&frame))
}

/// Runs the whole pipeline: CSV in, PNG out, console summary along the way.
pub fn run_heatmap(input: &Path, config: &HeatmapConfig) -> Result<HeatmapSummary, HeatmapError> {
    fs::create_dir_all(&config.output_dir)?;

    let matrix = compute_correlation(input)?;
    println!(
        "Number of numeric features used for heatmap: {}",
        matrix.len()
    );

    let layout = HeatmapLayout::plan(&matrix, config);
    let output_path = config.output_path();
    render::render_png(&layout, &matrix, &output_path)?;
    show_figure(&output_path);

    println!("Saved heatmap to: {}", output_path.display());
    Ok(HeatmapSummary {
        n_features: matrix.len(),
        output_path,
        annotated: !layout.annotations.is_empty(),
    })
}

// There is no windowing backend; the saved file is the figure.
fn show_figure(path: &Path) {
    info!(
        "Interactive display is not available; open '{}' to view the heatmap",
        path.display()
    );
}
