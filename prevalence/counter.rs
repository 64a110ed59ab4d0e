//! Single-pass scan of the survey extract.
//!
//! Input is consumed one logical line at a time, so the file is never held in
//! memory as a whole. Rows of any length are accepted, and a blank line is a
//! row with no fields.

use super::PrevalenceError;
use super::classify::{BiomarkerReading, ColumnIndex, RowFlags};
use crate::config::PrevalenceConfig;
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Running totals. `undiagnosed` is counted per row, never derived from the other totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrevalenceCounter {
    pub total: u64,
    pub diagnosed: u64,
    pub biomarker_positive: u64,
    pub biomarker_missing: u64,
    pub undiagnosed: u64,
}

impl PrevalenceCounter {
    pub fn record(&mut self, flags: RowFlags) {
        self.total += 1;
        if flags.self_reported {
            self.diagnosed += 1;
        }
        match flags.biomarker {
            BiomarkerReading::Positive => self.biomarker_positive += 1,
            BiomarkerReading::Missing => self.biomarker_missing += 1,
            BiomarkerReading::Negative | BiomarkerReading::Absent => {}
        }
        if flags.is_inferred_undiagnosed() {
            self.undiagnosed += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiomarkerSummary {
    pub positive: u64,
    pub missing: u64,
    pub undiagnosed: u64,
}

/// Final statistics. A statistic whose column is absent is `None`, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PrevalenceReport {
    pub total: u64,
    pub diagnosed: Option<u64>,
    pub biomarker: Option<BiomarkerSummary>,
    pub self_report_column: String,
    pub biomarker_column: String,
    pub biomarker_cutoff: f64,
}

impl PrevalenceReport {
    fn from_counts(counter: PrevalenceCounter, index: ColumnIndex, config: &PrevalenceConfig) -> Self {
        Self {
            total: counter.total,
            diagnosed: index.self_report.map(|_| counter.diagnosed),
            biomarker: index.biomarker.map(|_| BiomarkerSummary {
                positive: counter.biomarker_positive,
                missing: counter.biomarker_missing,
                undiagnosed: counter.undiagnosed,
            }),
            self_report_column: config.self_report_column.clone(),
            biomarker_column: config.biomarker_column.clone(),
            biomarker_cutoff: config.biomarker_cutoff,
        }
    }

    fn share_of_total(&self, count: impl Fn(&BiomarkerSummary) -> u64) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        self.biomarker
            .as_ref()
            .map(|summary| count(summary) as f64 / self.total as f64)
    }

    /// Fraction of all rows that are biomarker-positive.
    pub fn biomarker_prevalence(&self) -> Option<f64> {
        self.share_of_total(|summary| summary.positive)
    }

    /// Fraction of all rows that are biomarker-positive without a self-reported diagnosis.
    pub fn undiagnosed_prevalence(&self) -> Option<f64> {
        self.share_of_total(|summary| summary.undiagnosed)
    }
}

impl fmt::Display for PrevalenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let self_report = &self.self_report_column;
        let cutoff = self.biomarker_cutoff;

        writeln!(f, "Rows scanned: {}", self.total)?;
        match self.diagnosed {
            Some(diagnosed) => writeln!(f, "Diagnosed ({self_report}==1): {diagnosed}")?,
            None => writeln!(f, "{self_report} column not found in CSV header")?,
        }
        match &self.biomarker {
            Some(summary) => {
                writeln!(
                    f,
                    "Biomarker HbA1c>={cutoff:?}: {} (missing HbA1c values: {})",
                    summary.positive, summary.missing
                )?;
                writeln!(
                    f,
                    "Inferred undiagnosed (HbA1c>={cutoff:?} and {self_report}!=1): {}",
                    summary.undiagnosed
                )?;
            }
            None => writeln!(f, "{} column not found in CSV header", self.biomarker_column)?,
        }
        if let Some(share) = self.biomarker_prevalence() {
            writeln!(
                f,
                "Prevalence (biomarker) among all rows: {:.4}%",
                share * 100.0
            )?;
        }
        if let Some(share) = self.undiagnosed_prevalence() {
            writeln!(
                f,
                "Prevalence inferred undiagnosed among all rows: {:.4}%",
                share * 100.0
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Text,
    Blank,
    End,
}

/// Reads the next logical line into `buffer`, joining physical lines while a
/// quoted field is still open. The terminator is kept.
fn read_logical_line(input: &mut impl BufRead, buffer: &mut Vec<u8>) -> io::Result<LineKind> {
    buffer.clear();
    while input.read_until(b'\n', buffer)? > 0 {
        if buffer.iter().filter(|&&b| b == b'"').count() % 2 == 0 {
            break;
        }
    }
    if buffer.is_empty() {
        Ok(LineKind::End)
    } else if buffer.iter().all(|&b| b == b'\n' || b == b'\r') {
        Ok(LineKind::Blank)
    } else {
        Ok(LineKind::Text)
    }
}

/// Scans CSV data from any reader. The first record is the header.
pub fn scan_reader<R: Read>(
    reader: R,
    config: &PrevalenceConfig,
) -> Result<PrevalenceReport, PrevalenceError> {
    let mut input = BufReader::new(reader);
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true);

    let mut index: Option<ColumnIndex> = None;
    let mut counter = PrevalenceCounter::default();
    let mut record = StringRecord::new();
    let mut line = Vec::new();
    let mut accept = |row: &StringRecord| {
        if let Some(index) = &index {
            counter.record(index.classify(row, config));
            return;
        }
        let resolved = ColumnIndex::resolve(row.iter(), config);
        debug!(
            "Resolved columns: {}={:?}, {}={:?}",
            config.self_report_column, resolved.self_report, config.biomarker_column, resolved.biomarker
        );
        index = Some(resolved);
    };

    loop {
        match read_logical_line(&mut input, &mut line)? {
            LineKind::End => break,
            LineKind::Blank => {
                record.clear();
                accept(&record);
            }
            LineKind::Text => {
                let mut csv_reader = builder.from_reader(line.as_slice());
                while csv_reader.read_record(&mut record)? {
                    accept(&record);
                }
            }
        }
    }

    let index = index.unwrap_or_default();
    Ok(PrevalenceReport::from_counts(counter, index, config))
}

/// Scans the CSV file at `path`.
pub fn scan_path(path: &Path, config: &PrevalenceConfig) -> Result<PrevalenceReport, PrevalenceError> {
    if !path.exists() {
        return Err(PrevalenceError::InputNotFound(path.to_path_buf()));
    }
    debug!("Scanning '{}'", path.display());
    scan_reader(File::open(path)?, config)
}
