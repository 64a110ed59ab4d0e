//! Per-row flags for the self-report and biomarker fields.

use crate::config::PrevalenceConfig;
use csv::StringRecord;

/// Outcome of reading the biomarker field of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiomarkerReading {
    /// The column is not in the header, or the row is too short to hold it.
    Absent,
    /// The field is present but empty or not a number.
    Missing,
    Negative,
    Positive,
}

impl BiomarkerReading {
    pub fn is_positive(self) -> bool {
        self == BiomarkerReading::Positive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFlags {
    pub self_reported: bool,
    pub biomarker: BiomarkerReading,
}

impl RowFlags {
    /// Biomarker-positive without a self-reported diagnosis, judged on this row alone.
    pub fn is_inferred_undiagnosed(&self) -> bool {
        self.biomarker.is_positive() && !self.self_reported
    }
}

/// Header positions of the two fields the scan needs. Either may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnIndex {
    pub self_report: Option<usize>,
    pub biomarker: Option<usize>,
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ColumnIndex {
    /// Matches header names after trimming and lowercasing; the first match wins.
    pub fn resolve<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        config: &PrevalenceConfig,
    ) -> Self {
        let wanted_self_report = normalize_header(&config.self_report_column);
        let wanted_biomarker = normalize_header(&config.biomarker_column);

        let mut index = ColumnIndex::default();
        for (position, header) in headers.into_iter().enumerate() {
            let normalized = normalize_header(header);
            if index.self_report.is_none() && normalized == wanted_self_report {
                index.self_report = Some(position);
            }
            if index.biomarker.is_none() && normalized == wanted_biomarker {
                index.biomarker = Some(position);
            }
        }
        index
    }

    pub fn classify(&self, record: &StringRecord, config: &PrevalenceConfig) -> RowFlags {
        let self_reported = self
            .self_report
            .and_then(|i| record.get(i))
            .is_some_and(|raw| is_self_reported(raw, &config.truthy_tokens));
        let biomarker = match self.biomarker {
            Some(i) => classify_biomarker(record.get(i), config.biomarker_cutoff),
            None => BiomarkerReading::Absent,
        };
        RowFlags {
            self_reported,
            biomarker,
        }
    }
}

/// A self-reported diagnosis is the number 1, or one of the accepted tokens
/// when the field is not numeric. An empty field is simply not a diagnosis.
pub fn is_self_reported(raw: &str, truthy_tokens: &[String]) -> bool {
    let value = raw.trim();
    if value.is_empty() {
        return false;
    }
    match value.parse::<f64>() {
        Ok(number) => number == 1.0,
        Err(_) => {
            let lowered = value.to_lowercase();
            truthy_tokens
                .iter()
                .any(|token| token.to_lowercase() == lowered)
        }
    }
}

/// `None` means the row ended before the biomarker column.
pub fn classify_biomarker(raw: Option<&str>, cutoff: f64) -> BiomarkerReading {
    let Some(raw) = raw else {
        return BiomarkerReading::Absent;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value >= cutoff => BiomarkerReading::Positive,
        Ok(_) => BiomarkerReading::Negative,
        Err(_) => BiomarkerReading::Missing,
    }
}
