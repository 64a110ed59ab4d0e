//! # Analysis Configuration
//!
//! Every domain decision the pipelines make (file locations, the annotation
//! threshold, the biomarker cutoff, the accepted truthy tokens) lives here
//! instead of being scattered through the code as literals.
//!
//! A configuration can be read from a TOML file. Every field carries a default,
//! so a file only needs to name the values it wants to override, and an absent
//! file yields exactly the stock behaviour.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The survey extract both pipelines read when no path is given.
pub const DEFAULT_INPUT_PATH: &str = "Cleaning_data_cleaned.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Top-level configuration shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Path to the comma-delimited survey extract.
    pub input: PathBuf,
    pub heatmap: HeatmapConfig,
    pub prevalence: PrevalenceConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            heatmap: HeatmapConfig::default(),
            prevalence: PrevalenceConfig::default(),
        }
    }
}

/// Presentation policy for the correlation heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Directory the figure is written into. Created on every run.
    pub output_dir: PathBuf,
    pub output_file: String,
    /// Cell values are printed only while the feature count stays at or below this.
    pub annotate_threshold: usize,
    pub dpi: u32,
    pub min_width_in: f64,
    pub min_height_in: f64,
    /// Figure growth per feature, applied to both axes.
    pub inches_per_feature: f64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("figures"),
            output_file: "pearson_heatmap_all_features.png".to_string(),
            annotate_threshold: 30,
            dpi: 200,
            min_width_in: 10.0,
            min_height_in: 8.0,
            inches_per_feature: 0.25,
        }
    }
}

impl HeatmapConfig {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}

/// Column names and thresholds for the undiagnosed-prevalence scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrevalenceConfig {
    /// Self-reported diagnosis field (matched case-insensitively).
    pub self_report_column: String,
    /// Glycated haemoglobin field (matched case-insensitively).
    pub biomarker_column: String,
    /// A biomarker reading at or above this value counts as positive.
    pub biomarker_cutoff: f64,
    /// Non-numeric self-report values accepted as a positive answer.
    pub truthy_tokens: Vec<String>,
}

impl Default for PrevalenceConfig {
    fn default() -> Self {
        Self {
            self_report_column: "DIQ010".to_string(),
            biomarker_column: "LBXGH".to_string(),
            biomarker_cutoff: 6.5,
            truthy_tokens: ["1", "yes", "y", "true"]
                .iter()
                .map(|token| token.to_string())
                .collect(),
        }
    }
}

impl AnalysisConfig {
    /// Loads a configuration from a TOML file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&toml_string)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make either pipeline meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let heatmap = &self.heatmap;
        if heatmap.dpi == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heatmap.dpi",
                reason: "must be at least 1".to_string(),
            });
        }
        if heatmap.output_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "heatmap.output_file",
                reason: "must not be empty".to_string(),
            });
        }
        for (field, value) in [
            ("heatmap.min_width_in", heatmap.min_width_in),
            ("heatmap.min_height_in", heatmap.min_height_in),
            ("heatmap.inches_per_feature", heatmap.inches_per_feature),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a finite, non-negative number (got {value})"),
                });
            }
        }

        let prevalence = &self.prevalence;
        if !prevalence.biomarker_cutoff.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "prevalence.biomarker_cutoff",
                reason: format!("must be finite (got {})", prevalence.biomarker_cutoff),
            });
        }
        for (field, name) in [
            ("prevalence.self_report_column", &prevalence.self_report_column),
            ("prevalence.biomarker_column", &prevalence.biomarker_column),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "column name must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
