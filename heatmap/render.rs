//! Rasterises a [`HeatmapLayout`] to PNG.
//!
//! Everything is placed in pixel space directly on the root drawing area:
//! title band on top, the square cell grid with row labels on its left and
//! rotated column labels under it, and the colorbar to its right.

use super::HeatmapError;
use super::correlation::CorrelationMatrix;
use super::layout::{
    COLOR_RANGE, COLORBAR_LABEL, FigureSize, HeatmapLayout, TITLE, colormap, ramp_color,
    ramp_position,
};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::path::Path;

const FONT: &str = "sans-serif";
const TITLE_PT: f64 = 12.0;
const LABEL_PT: f64 = 8.0;
const ANNOTATION_PT: f64 = 6.0;
const NOTE_PT: f64 = 9.0;
const COLORBAR_STEPS: usize = 100;
const COLORBAR_TICKS: [f64; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Pixel placement of the grid and colorbar for one figure.
struct Geometry {
    left: f64,
    top: f64,
    grid: f64,
    cell: f64,
    colorbar_x: f64,
    colorbar_w: f64,
    pad: f64,
}

impl Geometry {
    fn new(size: &FigureSize, n_features: usize, labels: &[String]) -> Self {
        let width = size.width_px() as f64;
        let height = size.height_px() as f64;
        let label_px = size.points_to_px(LABEL_PT);
        let pad = size.points_to_px(4.0);

        let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(1) as f64;
        let label_extent = (longest * label_px * 0.6 + pad).min(0.3 * width.min(height));

        let left = label_extent + pad;
        let top = size.points_to_px(TITLE_PT) * 3.0;
        let right_band = 0.16 * width;
        let bottom = label_extent + pad;

        let avail_w = (width - left - right_band).max(1.0);
        let avail_h = (height - top - bottom).max(1.0);
        let grid = avail_w.min(avail_h);
        let cell = grid / n_features.max(1) as f64;

        Self {
            left,
            top,
            grid,
            cell,
            colorbar_x: left + grid + 0.03 * width,
            colorbar_w: 0.025 * width,
            pad,
        }
    }

    fn cell_rect(&self, row: usize, col: usize) -> [(i32, i32); 2] {
        let x0 = self.left + col as f64 * self.cell;
        let y0 = self.top + row as f64 * self.cell;
        let gap = if self.cell >= 4.0 { 1.0 } else { 0.0 };
        [
            (px(x0 + gap), px(y0 + gap)),
            (px(x0 + self.cell - gap), px(y0 + self.cell - gap)),
        ]
    }

    fn cell_center(&self, row: usize, col: usize) -> (i32, i32) {
        (
            px(self.left + (col as f64 + 0.5) * self.cell),
            px(self.top + (row as f64 + 0.5) * self.cell),
        )
    }

    fn bottom(&self) -> f64 {
        self.top + self.grid
    }

    fn value_to_y(&self, value: f64) -> f64 {
        let (lo, hi) = COLOR_RANGE;
        self.top + (1.0 - (value - lo) / (hi - lo)) * self.grid
    }
}

fn px(value: f64) -> i32 {
    value.round() as i32
}

/// Writes the heatmap described by `layout` to `path` as a PNG.
pub fn render_png(
    layout: &HeatmapLayout,
    matrix: &CorrelationMatrix,
    path: &Path,
) -> Result<(), HeatmapError> {
    draw_figure(layout, matrix, path).map_err(|e| HeatmapError::Render {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn draw_figure(
    layout: &HeatmapLayout,
    matrix: &CorrelationMatrix,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let size = layout.size;
    let root = BitMapBackend::new(path, (size.width_px(), size.height_px())).into_drawing_area();
    root.fill(&WHITE)?;

    let geo = Geometry::new(&size, layout.n_features, matrix.labels());

    root.draw(&Text::new(
        TITLE,
        (px(geo.left + geo.grid / 2.0), px(geo.top / 2.0)),
        (FONT, size.points_to_px(TITLE_PT))
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center)),
    ))?;

    // Masked cells are simply never painted and stay white.
    for &(row, col) in &layout.cells {
        if let Some(color) = colormap(matrix.get(row, col)) {
            root.draw(&Rectangle::new(geo.cell_rect(row, col), color.filled()))?;
        }
    }

    draw_tick_labels(&root, &geo, &size, matrix.labels())?;

    let annotation_px = size.points_to_px(ANNOTATION_PT).min(geo.cell * 0.45);
    for annotation in &layout.annotations {
        let text_color = match ramp_position(matrix.get(annotation.row, annotation.col)) {
            Some(t) if t < 0.5 => WHITE,
            _ => BLACK,
        };
        root.draw(&Text::new(
            annotation.text.as_str(),
            geo.cell_center(annotation.row, annotation.col),
            (FONT, annotation_px)
                .into_font()
                .color(&text_color)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
    }

    if let Some(note) = layout.note {
        draw_note(&root, &geo, &size, note)?;
    }

    draw_colorbar(&root, &geo, &size)?;

    root.present()?;
    Ok(())
}

fn draw_tick_labels(
    root: &Area<'_>,
    geo: &Geometry,
    size: &FigureSize,
    labels: &[String],
) -> Result<(), Box<dyn Error>> {
    let label_px = size.points_to_px(LABEL_PT);
    for (i, label) in labels.iter().enumerate() {
        let (cx, cy) = geo.cell_center(i, i);
        root.draw(&Text::new(
            label.as_str(),
            (px(geo.left - geo.pad), cy),
            (FONT, label_px)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        ))?;
        root.draw(&Text::new(
            label.as_str(),
            (cx, px(geo.bottom() + geo.pad)),
            (FONT, label_px)
                .into_font()
                .transform(FontTransform::Rotate270)
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        ))?;
    }
    Ok(())
}

fn draw_note(
    root: &Area<'_>,
    geo: &Geometry,
    size: &FigureSize,
    note: &str,
) -> Result<(), Box<dyn Error>> {
    let note_px = size.points_to_px(NOTE_PT);
    let x0 = geo.left + geo.pad;
    let y0 = geo.top + geo.pad;
    let box_w = note.chars().count() as f64 * note_px * 0.55 + 2.0 * geo.pad;
    let box_h = note_px * 1.8;
    let corners = [(px(x0), px(y0)), (px(x0 + box_w), px(y0 + box_h))];

    root.draw(&Rectangle::new(corners, WHITE.mix(0.7).filled()))?;
    root.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))?;
    root.draw(&Text::new(
        note,
        (px(x0 + geo.pad), px(y0 + box_h / 2.0)),
        (FONT, note_px)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center)),
    ))?;
    Ok(())
}

fn draw_colorbar(root: &Area<'_>, geo: &Geometry, size: &FigureSize) -> Result<(), Box<dyn Error>> {
    let x0 = geo.colorbar_x;
    let x1 = geo.colorbar_x + geo.colorbar_w;
    let step = geo.grid / COLORBAR_STEPS as f64;

    for i in 0..COLORBAR_STEPS {
        let y_start = geo.top + i as f64 * step;
        let t = 1.0 - (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        root.draw(&Rectangle::new(
            [(px(x0), px(y_start)), (px(x1), px(y_start + step) + 1)],
            ramp_color(t).filled(),
        ))?;
    }
    root.draw(&Rectangle::new(
        [(px(x0), px(geo.top)), (px(x1), px(geo.bottom()))],
        BLACK.stroke_width(1),
    ))?;

    let label_px = size.points_to_px(LABEL_PT);
    let tick_len = geo.pad;
    for value in COLORBAR_TICKS {
        let y = px(geo.value_to_y(value));
        root.draw(&PathElement::new(
            vec![(px(x1), y), (px(x1 + tick_len), y)],
            &BLACK,
        ))?;
        root.draw(&Text::new(
            format!("{value:.1}"),
            (px(x1 + tick_len * 1.5), y),
            (FONT, label_px)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }

    root.draw(&Text::new(
        COLORBAR_LABEL,
        (px(x1 + label_px * 4.5), px(geo.top + geo.grid / 2.0)),
        (FONT, label_px)
            .into_font()
            .transform(FontTransform::Rotate90)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center)),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeatmapConfig;
    use crate::heatmap::frame::NumericFrame;

    fn small_matrix() -> CorrelationMatrix {
        let frame = NumericFrame::from_columns(vec![
            ("a".to_string(), vec![Some(1.0), Some(2.0), Some(3.0)]),
            ("b".to_string(), vec![Some(2.0), Some(4.0), Some(6.0)]),
        ])
        .unwrap();
        CorrelationMatrix::from_frame(&frame)
    }

    #[test]
    fn geometry_keeps_the_grid_inside_the_figure() {
        let config = HeatmapConfig::default();
        let size = FigureSize::for_features(40, &config);
        let labels: Vec<String> = (0..40).map(|i| format!("FEATURE_{i:02}")).collect();
        let geo = Geometry::new(&size, 40, &labels);

        assert!(geo.left > 0.0 && geo.top > 0.0);
        assert!(geo.bottom() < size.height_px() as f64);
        assert!(geo.colorbar_x + geo.colorbar_w < size.width_px() as f64);
        let [(x0, y0), (x1, y1)] = geo.cell_rect(39, 0);
        assert!(x0 < x1 && y0 < y1);
        assert!(y1 as f64 <= geo.bottom());
    }

    #[test]
    fn colorbar_ticks_run_top_to_bottom() {
        let size = FigureSize::for_features(2, &HeatmapConfig::default());
        let geo = Geometry::new(&size, 2, &["a".to_string(), "b".to_string()]);
        assert_eq!(geo.value_to_y(1.0), geo.top);
        assert_eq!(geo.value_to_y(-1.0), geo.bottom());
    }

    #[test]
    fn unwritable_destination_is_a_render_error() {
        let matrix = small_matrix();
        let layout = HeatmapLayout::plan(&matrix, &HeatmapConfig::default());
        let target = Path::new("no/such/directory/heatmap.png");
        match render_png(&layout, &matrix, target) {
            Err(HeatmapError::Render { path, .. }) => assert_eq!(path, target),
            other => panic!("Expected a render error, got {other:?}"),
        }
    }

    fn font_available() -> bool {
        (FONT, 10).into_font().box_size("x").is_ok()
    }

    #[test]
    fn writes_a_png_file() {
        if !font_available() {
            eprintln!("skipping: no '{FONT}' font installed");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("heatmap.png");
        let matrix = small_matrix();
        let layout = HeatmapLayout::plan(&matrix, &HeatmapConfig::default());
        render_png(&layout, &matrix, &target).unwrap();
        let bytes = std::fs::read(&target).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
