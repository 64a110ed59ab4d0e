//! Pairwise-complete Pearson correlation.
//!
//! Each coefficient is computed over the rows present in both columns, so a
//! missing value only removes that row from the pairs it participates in.
//! A coefficient is undefined (NaN) when the pair shares no rows or when either
//! column has zero variance over the shared rows.

use super::frame::NumericFrame;
use itertools::Itertools;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Square correlation matrix indexed by feature name on both axes.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn from_frame(frame: &NumericFrame) -> Self {
        Self {
            labels: frame.names().to_vec(),
            values: pearson_pairwise_complete(frame.values()),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[[row, col]]
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}

/// Computes the Pearson matrix of the columns of `values` (rows = observations,
/// NaN = missing). The result is exactly symmetric and every defined entry lies
/// in `[-1, 1]`.
pub fn pearson_pairwise_complete(values: ArrayView2<f64>) -> Array2<f64> {
    let n = values.ncols();
    let mut out = Array2::from_elem((n, n), f64::NAN);

    for i in 0..n {
        out[[i, i]] = pair_coefficient(values.column(i), values.column(i));
    }
    for (i, j) in (0..n).tuple_combinations() {
        let r = pair_coefficient(values.column(i), values.column(j));
        out[[i, j]] = r;
        out[[j, i]] = r;
    }
    out
}

fn pair_coefficient(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let complete = || {
        x.iter()
            .zip(y.iter())
            .filter(|(a, b)| !a.is_nan() && !b.is_nan())
    };

    let (count, sum_x, sum_y) = complete()
        .fold((0usize, 0.0f64, 0.0f64), |(c, sx, sy), (&a, &b)| (c + 1, sx + a, sy + b));
    if count == 0 {
        return f64::NAN;
    }
    let mean_x = sum_x / count as f64;
    let mean_y = sum_y / count as f64;

    // Second pass on the deviations keeps the sums well conditioned.
    let (ss_x, ss_y, cross) = complete().fold((0.0f64, 0.0f64, 0.0f64), |(sxx, syy, sxy), (&a, &b)| {
        let dx = a - mean_x;
        let dy = b - mean_y;
        (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
    });

    let divisor = (ss_x * ss_y).sqrt();
    if divisor == 0.0 {
        return f64::NAN;
    }
    (cross / divisor).clamp(-1.0, 1.0)
}
