//! # Undiagnosed-Prevalence Counter
//!
//! Estimates how many respondents have a biomarker reading at or above the
//! diagnostic cutoff without having reported a diagnosis. Each row carries two
//! independent flags (self-report, biomarker); the "inferred undiagnosed" count
//! is the rows where the biomarker flag is set and the self-report flag is not.
//!
//! Data-quality problems never abort the scan: an absent column is reported as
//! such, an unparseable biomarker value is tallied as missing, and a short row
//! only loses the fields it does not reach.

pub mod classify;
pub mod counter;

use crate::config::PrevalenceConfig;
use counter::PrevalenceReport;
use log::warn;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrevalenceError {
    #[error("CSV file not found at: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("Failed to read CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scans `input` and prints the summary report to stdout.
pub fn run_prevalence(
    input: &Path,
    config: &PrevalenceConfig,
) -> Result<PrevalenceReport, PrevalenceError> {
    let report = counter::scan_path(input, config)?;
    if report.diagnosed.is_none() {
        warn!(
            "Column '{}' not found; self-report statistics skipped",
            config.self_report_column
        );
    }
    if report.biomarker.is_none() {
        warn!(
            "Column '{}' not found; biomarker statistics skipped",
            config.biomarker_column
        );
    }
    print!("{report}");
    Ok(report)
}
