use std::path::{Path, PathBuf};

use ndarray::Array2;
use plotters::{
    coord::{types::RangedCoordf64, Shift},
    prelude::*,
};

use crate::{
    aperture::ApertureKind,
    diffraction::{DiffractionPattern, PatternSink},
    error::{Error, Result},
};

// The amplitude panel is always drawn over this square, whatever the sampled extent.
pub const APERTURE_PLOT_EXTENT: f64 = 0.5;
pub const FIGURE_SIZE: (u32, u32) = (1200, 600);
// Arrays larger than this per axis are reduced before drawing, one rectangle per cell.
pub const MAX_CELLS: usize = 300;
const COLORBAR_STEPS: usize = 128;

type Chart2d<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Colormap {
    // Black for low values, white for high.
    Gray,
    Inferno,
}

impl Colormap {
    pub fn color(self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0. } else { t.clamp(0., 1.) };
        let c = match self {
            Colormap::Gray => colorous::GREYS.eval_continuous(1. - t),
            Colormap::Inferno => colorous::INFERNO.eval_continuous(t),
        };
        RGBColor(c.r, c.g, c.b)
    }
}

// ln(1 + I), compressing the range between the central peak and the fringes.
pub fn log_intensity(intensity: &Array2<f64>) -> Array2<f64> {
    intensity.mapv(f64::ln_1p)
}

/// Shrinks `values` so neither axis exceeds `max_cells`, keeping the largest value of each
/// block so narrow bright features survive.
pub fn downsample_max(values: &Array2<f64>, max_cells: usize) -> Array2<f64> {
    let (rows, cols) = values.dim();
    let max_cells = max_cells.max(1);
    let stride = |n: usize| (n + max_cells - 1) / max_cells;
    let (sr, sc) = (stride(rows).max(1), stride(cols).max(1));
    if sr == 1 && sc == 1 {
        return values.clone();
    }

    let shape = ((rows + sr - 1) / sr, (cols + sc - 1) / sc);
    Array2::from_shape_fn(shape, |(i, j)| {
        let block = values.slice(ndarray::s![
            i * sr..((i + 1) * sr).min(rows),
            j * sc..((j + 1) * sc).min(cols)
        ]);
        block.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

fn value_range(values: &Array2<f64>) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        (0., 1.)
    } else if lo == hi {
        (lo, lo + 1.)
    } else {
        (lo, hi)
    }
}

// Tick text for a value on an axis spanning `span`. Values within rounding noise of zero
// print as zero instead of something like -5.55e-17.
fn tick_label(value: f64, span: f64, scientific: bool) -> String {
    let value = if value.abs() < 1e-12 * span.abs() { 0. } else { value };
    if scientific {
        format!("{:.2e}", value)
    } else {
        format!("{:.3}", value)
    }
}

// A non-empty axis range, padding degenerate extents so the chart can still be built.
fn axis_range(lo: f64, hi: f64) -> std::ops::Range<f64> {
    if hi > lo {
        lo..hi
    } else {
        let pad = if lo == 0. { 1. } else { lo.abs() };
        lo - pad..lo + pad
    }
}

/// One image panel: values laid out on a rectangle of the plane, row 0 at the bottom.
#[derive(Clone, Debug)]
pub struct Heatmap {
    pub title: String,
    pub values: Array2<f64>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub cmap: Colormap,
}

impl Heatmap {
    pub fn new(
        title: impl Into<String>,
        values: &Array2<f64>,
        x_range: (f64, f64),
        y_range: (f64, f64),
        cmap: Colormap,
    ) -> Heatmap {
        Heatmap {
            title: title.into(),
            values: downsample_max(values, MAX_CELLS),
            x_range,
            y_range,
            cmap,
        }
    }

    pub fn value_range(&self) -> (f64, f64) {
        value_range(&self.values)
    }

    // Paints one filled rectangle per cell onto an existing chart.
    fn draw_cells<DB: DrawingBackend>(
        &self,
        chart: &mut Chart2d<DB>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (rows, cols) = self.values.dim();
        if rows == 0 || cols == 0 {
            return Ok(());
        }
        let (vmin, vmax) = self.value_range();
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let w = (x1 - x0) / cols as f64;
        let h = (y1 - y0) / rows as f64;

        chart.draw_series(self.values.indexed_iter().map(|((i, j), &v)| {
            let x = x0 + j as f64 * w;
            let y = y0 + i as f64 * h;
            let color = self.cmap.color((v - vmin) / (vmax - vmin));
            Rectangle::new([(x, y), (x + w, y + h)], color.filled())
        }))?;
        Ok(())
    }

    fn draw_colorbar<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (vmin, vmax) = self.value_range();
        let mut bar = ChartBuilder::on(area)
            .margin_top(40)
            .margin_bottom(40)
            .margin_right(5)
            .set_label_area_size(LabelAreaPosition::Right, 55)
            .build_cartesian_2d(0f64..1f64, vmin..vmax)?;

        bar.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(6)
            .y_label_style(("sans-serif", 12))
            .y_label_formatter(&|v| tick_label(*v, vmax - vmin, false))
            .draw()?;

        let step = (vmax - vmin) / COLORBAR_STEPS as f64;
        bar.draw_series((0..COLORBAR_STEPS).map(|k| {
            let lo = vmin + k as f64 * step;
            let color = self.cmap.color((k as f64 + 0.5) / COLORBAR_STEPS as f64);
            Rectangle::new([(0., lo), (1., lo + step)], color.filled())
        }))?;
        Ok(())
    }

    pub fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (image, bar) = area.split_horizontally((85i32).percent_width());

        let x_axis = axis_range(self.x_range.0, self.x_range.1);
        let y_axis = axis_range(self.y_range.0, self.y_range.1);
        let (x_span, y_span) = (x_axis.end - x_axis.start, y_axis.end - y_axis.start);

        let mut chart = ChartBuilder::on(&image)
            .caption(&self.title, ("sans-serif", 22))
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_axis, y_axis)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("x [m]")
            .y_desc("y [m]")
            .x_labels(5)
            .y_labels(5)
            .x_label_formatter(&|v| tick_label(*v, x_span, true))
            .y_label_formatter(&|v| tick_label(*v, y_span, true))
            .draw()?;

        self.draw_cells(&mut chart)?;
        self.draw_colorbar(&bar)
    }
}

/// The two-panel figure: aperture amplitude on the left, log intensity on the right.
#[derive(Clone, Debug)]
pub struct DiffractionFigure {
    pub amplitude: Heatmap,
    pub intensity: Heatmap,
}

impl DiffractionFigure {
    pub fn new(amplitude: &Array2<f64>, pattern: &DiffractionPattern) -> DiffractionFigure {
        let (x0, x1, y0, y1) = pattern.extent();
        let e = APERTURE_PLOT_EXTENT;
        DiffractionFigure {
            amplitude: Heatmap::new(
                "Amplitude distribution",
                amplitude,
                (-e, e),
                (-e, e),
                Colormap::Gray,
            ),
            intensity: Heatmap::new(
                "Fraunhofer diffraction",
                &log_intensity(&pattern.intensity),
                (x0, x1),
                (y0, y1),
                Colormap::Inferno,
            ),
        }
    }

    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;
        let panels = root.split_evenly((1, 2));
        self.amplitude.draw(&panels[0])?;
        self.intensity.draw(&panels[1])
    }

    // Writes the figure as an image, replacing any existing file.
    pub fn save(&self, filename: impl AsRef<Path>) -> Result<()> {
        let root = BitMapBackend::new(filename.as_ref(), FIGURE_SIZE).into_drawing_area();
        self.draw(&root).map_err(plot_error)?;
        root.present().map_err(plot_error)?;
        Ok(())
    }
}

fn plot_error(e: impl std::fmt::Display) -> Error {
    Error::Plot(e.to_string())
}

pub fn plot_diffraction(
    amplitude: &Array2<f64>,
    pattern: &DiffractionPattern,
    filename: impl AsRef<Path>,
) -> Result<()> {
    DiffractionFigure::new(amplitude, pattern).save(filename)
}

/// Saves each pattern as `<aperture name>.png` under a fixed directory.
pub struct PngSink {
    output_dir: PathBuf,
}

impl PngSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<PngSink> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(PngSink { output_dir })
    }

    pub fn path_for(&self, kind: ApertureKind) -> PathBuf {
        self.output_dir.join(format!("{}.png", kind))
    }
}

impl PatternSink for PngSink {
    fn consume(
        &mut self,
        kind: ApertureKind,
        amplitude: &Array2<f64>,
        pattern: &DiffractionPattern,
    ) -> Result<()> {
        let path = self.path_for(kind);
        plot_diffraction(amplitude, pattern, &path)?;
        log::info!("Saved {}", path.display());
        Ok(())
    }
}
