//! Presentation policy for the heatmap, kept free of any drawing so it can be
//! checked directly.
//!
//! Only the lower triangle (diagonal included) is shown. Cell values are
//! printed while the matrix is small enough to stay readable; past the
//! configured threshold a single explanatory note replaces them.

use super::correlation::CorrelationMatrix;
use crate::config::HeatmapConfig;
use itertools::iproduct;
use plotters::style::RGBColor;

pub const TITLE: &str = "Pearson Correlation Heatmap (lower triangle shown)";
pub const COLORBAR_LABEL: &str = "Pearson correlation coefficient";
pub const OMITTED_NOTE: &str = "Annotations omitted for readability (too many variables)";

/// Value range mapped onto the colour ramp.
pub const COLOR_RANGE: (f64, f64) = (-1.0, 1.0);

// Anchor colours sampled from the viridis ramp at 0, 1/4, 1/2, 3/4 and 1.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl FigureSize {
    /// Both axes grow linearly with the feature count, never below the minimum.
    pub fn for_features(n_features: usize, config: &HeatmapConfig) -> Self {
        let scaled = n_features as f64 * config.inches_per_feature;
        Self {
            width_in: config.min_width_in.max(scaled),
            height_in: config.min_height_in.max(scaled),
            dpi: config.dpi,
        }
    }

    pub fn width_px(&self) -> u32 {
        (self.width_in * self.dpi as f64).round() as u32
    }

    pub fn height_px(&self) -> u32 {
        (self.height_in * self.dpi as f64).round() as u32
    }

    /// Converts a typographic point size into pixels at this figure's DPI.
    pub fn points_to_px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellAnnotation {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct HeatmapLayout {
    pub size: FigureSize,
    pub n_features: usize,
    /// `(row, col)` of every drawn cell, row-major.
    pub cells: Vec<(usize, usize)>,
    pub annotations: Vec<CellAnnotation>,
    pub note: Option<&'static str>,
}

/// Lower triangle including the diagonal.
pub fn is_visible(row: usize, col: usize) -> bool {
    col <= row
}

impl HeatmapLayout {
    pub fn plan(matrix: &CorrelationMatrix, config: &HeatmapConfig) -> Self {
        let n = matrix.len();
        let cells: Vec<(usize, usize)> = iproduct!(0..n, 0..n)
            .filter(|&(row, col)| is_visible(row, col))
            .collect();

        let (annotations, note) = if n <= config.annotate_threshold {
            let annotations = cells
                .iter()
                .map(|&(row, col)| CellAnnotation {
                    row,
                    col,
                    text: format!("{:.2}", matrix.get(row, col)),
                })
                .collect();
            (annotations, None)
        } else {
            (Vec::new(), Some(OMITTED_NOTE))
        };

        Self {
            size: FigureSize::for_features(n, config),
            n_features: n,
            cells,
            annotations,
            note,
        }
    }
}

/// Position of `value` along the colour ramp, in `[0, 1]`. `None` when undefined.
pub fn ramp_position(value: f64) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    let (lo, hi) = COLOR_RANGE;
    Some(((value - lo) / (hi - lo)).clamp(0.0, 1.0))
}

/// Colour for a correlation value. Undefined values get no colour and are left blank.
pub fn colormap(value: f64) -> Option<RGBColor> {
    ramp_position(value).map(ramp_color)
}

pub fn ramp_color(t: f64) -> RGBColor {
    let segments = (VIRIDIS.len() - 1) as f64;
    let scaled = t.clamp(0.0, 1.0) * segments;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lower as f64;
    let (r0, g0, b0) = VIRIDIS[lower];
    let (r1, g1, b1) = VIRIDIS[lower + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::frame::NumericFrame;
    use approx::assert_abs_diff_eq;

    fn matrix_with_features(n: usize) -> CorrelationMatrix {
        let columns = (0..n)
            .map(|j| {
                let values = (0..6)
                    .map(|i| Some(((i * (j + 2)) % 7) as f64 + j as f64 * 0.1))
                    .collect();
                (format!("F{j}"), values)
            })
            .collect();
        CorrelationMatrix::from_frame(&NumericFrame::from_columns(columns).unwrap())
    }

    #[test]
    fn figure_size_has_a_floor_and_grows_linearly() {
        let config = HeatmapConfig::default();
        let small = FigureSize::for_features(5, &config);
        assert_abs_diff_eq!(small.width_in, 10.0);
        assert_abs_diff_eq!(small.height_in, 8.0);
        assert_eq!((small.width_px(), small.height_px()), (2000, 1600));

        let medium = FigureSize::for_features(36, &config);
        assert_abs_diff_eq!(medium.width_in, 10.0);
        assert_abs_diff_eq!(medium.height_in, 9.0);

        let large = FigureSize::for_features(80, &config);
        assert_abs_diff_eq!(large.width_in, 20.0);
        assert_abs_diff_eq!(large.height_in, 20.0);
    }

    #[test]
    fn only_lower_triangle_cells_are_drawn() {
        let layout = HeatmapLayout::plan(&matrix_with_features(4), &HeatmapConfig::default());
        assert_eq!(layout.cells.len(), 4 * 5 / 2);
        assert!(layout.cells.iter().all(|&(row, col)| col <= row));
        assert!(layout.cells.contains(&(3, 0)));
        assert!(!layout.cells.contains(&(0, 3)));
    }

    #[test]
    fn small_matrices_annotate_every_visible_cell() {
        let matrix = matrix_with_features(30);
        let layout = HeatmapLayout::plan(&matrix, &HeatmapConfig::default());
        assert_eq!(layout.note, None);
        assert_eq!(layout.annotations.len(), layout.cells.len());
        for annotation in &layout.annotations {
            assert!(is_visible(annotation.row, annotation.col));
            let expected = format!("{:.2}", matrix.get(annotation.row, annotation.col));
            assert_eq!(annotation.text, expected);
        }
        let diagonal = layout
            .annotations
            .iter()
            .find(|a| a.row == 0 && a.col == 0)
            .unwrap();
        assert_eq!(diagonal.text, "1.00");
    }

    #[test]
    fn large_matrices_get_a_note_instead_of_annotations() {
        let layout = HeatmapLayout::plan(&matrix_with_features(31), &HeatmapConfig::default());
        assert!(layout.annotations.is_empty());
        assert_eq!(layout.note, Some(OMITTED_NOTE));
    }

    #[test]
    fn threshold_is_configurable() {
        let config = HeatmapConfig {
            annotate_threshold: 2,
            ..HeatmapConfig::default()
        };
        let layout = HeatmapLayout::plan(&matrix_with_features(3), &config);
        assert!(layout.annotations.is_empty());
        assert!(layout.note.is_some());
    }

    #[test]
    fn colormap_spans_the_correlation_range() {
        assert_eq!(colormap(-1.0), Some(RGBColor(68, 1, 84)));
        assert_eq!(colormap(0.0), Some(RGBColor(33, 145, 140)));
        assert_eq!(colormap(1.0), Some(RGBColor(253, 231, 37)));
        assert_eq!(colormap(f64::NAN), None);
        assert_eq!(colormap(3.0), colormap(1.0));
    }
}
