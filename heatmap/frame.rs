//! Numeric feature matrix extraction.
//!
//! Reading goes through the `polars` CSV reader so column types are inferred
//! over the whole file: a column is a feature only if every present value
//! parses as a number. Text, boolean and all-empty columns never make it in.
//! The usual spreadsheet missing-value markers (`NA`, `N/A`, `NULL`, `nan`, ...)
//! read as missing, not as text.

use super::HeatmapError;
use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Cell contents read as missing in every column, alongside empty fields.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Numeric view of the survey table. Missing values are stored as NaN.
#[derive(Debug, Clone)]
pub struct NumericFrame {
    names: Vec<String>,
    values: Array2<f64>,
}

impl NumericFrame {
    /// Builds the frame from named columns of optional values.
    ///
    /// Columns with no present value are dropped first; if nothing survives the
    /// result is [`HeatmapError::NoNumericColumns`]. Rows missing in every
    /// surviving column are then dropped. NaN counts as missing. Source column
    /// order is preserved.
    pub fn from_columns(columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self, HeatmapError> {
        let retained: Vec<(String, Vec<f64>)> = columns
            .into_iter()
            .filter_map(|(name, values)| {
                let dense: Vec<f64> = values
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()).unwrap_or(f64::NAN))
                    .collect();
                if dense.iter().all(|v| v.is_nan()) {
                    debug!("Dropping column '{name}': no values present");
                    None
                } else {
                    Some((name, dense))
                }
            })
            .collect();

        if retained.is_empty() {
            return Err(HeatmapError::NoNumericColumns);
        }

        let height = retained
            .iter()
            .map(|(_, column)| column.len())
            .max()
            .unwrap_or(0);
        let present = |column: &[f64], row: usize| column.get(row).is_some_and(|v| !v.is_nan());
        let kept_rows: Vec<usize> = (0..height)
            .filter(|&row| retained.iter().any(|(_, column)| present(column.as_slice(), row)))
            .collect();
        if kept_rows.len() < height {
            debug!(
                "Dropping {} rows with no numeric values",
                height - kept_rows.len()
            );
        }

        let values = Array2::from_shape_fn((kept_rows.len(), retained.len()), |(i, j)| {
            retained[j].1.get(kept_rows[i]).copied().unwrap_or(f64::NAN)
        });
        let names = retained.into_iter().map(|(name, _)| name).collect();

        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.column(index)
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }
}

/// Reads `path` and extracts its numeric feature matrix.
pub fn load_numeric_frame(path: &Path) -> Result<NumericFrame, HeatmapError> {
    if !path.exists() {
        return Err(HeatmapError::InputNotFound(path.to_path_buf()));
    }

    debug!("Loading data from '{}'", path.display());
    let null_values = NA_TOKENS
        .iter()
        .map(|&token| PlSmallStr::from_static(token))
        .collect();
    let df = CsvReader::new(File::open(path)?)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(None)
                .with_parse_options(
                    CsvParseOptions::default()
                        .with_null_values(Some(NullValues::AllColumns(null_values))),
                ),
        )
        .finish()?;

    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let dtype = column.dtype();
        if !(dtype.is_integer() || dtype.is_float()) {
            debug!("Skipping non-numeric column '{}' ({dtype:?})", column.name());
            continue;
        }
        let casted = column.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = casted.f64()?.into_iter().collect();
        columns.push((column.name().to_string(), values));
    }

    NumericFrame::from_columns(columns)
}
