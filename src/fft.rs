use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};
use num::complex::Complex64;
use rustfft::{Fft, FftPlanner};

// Source index feeding position `i` of a sequence of length `n` after centring the zero
// frequency. Matches numpy's `fftshift`, which rolls forward by n / 2.
fn shifted_index(i: usize, n: usize) -> usize {
    (i + n - n / 2) % n
}

pub fn fftshift<T: Clone>(array: &Array2<T>) -> Array2<T> {
    let (rows, cols) = array.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        array[[shifted_index(i, rows), shifted_index(j, cols)]].clone()
    })
}

/// Sample frequencies of an `n` point DFT with sample spacing `d`, in the order the
/// transform produces them: `[0, 1, ..., ceil(n/2) - 1, -floor(n/2), ..., -1] / (d n)`.
pub fn fftfreq(n: usize, d: f64) -> Array1<f64> {
    let scale = 1. / (d * n as f64);
    Array1::from_shape_fn(n, |i| {
        let k = if i < (n + 1) / 2 {
            i as f64
        } else {
            i as f64 - n as f64
        };
        k * scale
    })
}

// `fftfreq(n, d)` with the zero frequency moved to index n / 2, ascending.
pub fn fftfreq_plottable(n: usize, d: f64) -> Array1<f64> {
    let scale = 1. / (d * n as f64);
    Array1::from_shape_fn(n, |i| (i as f64 - (n / 2) as f64) * scale)
}

// Runs a 1D plan over every lane of `array` along `axis`. Lanes are not contiguous for the
// column pass, so each one goes through a scratch buffer.
fn transform_lanes(array: &mut Array2<Complex64>, axis: Axis, plan: &Arc<dyn Fft<f64>>) {
    let mut buffer = vec![Complex64::new(0., 0.); array.len_of(axis)];
    for mut lane in array.lanes_mut(axis) {
        buffer
            .iter_mut()
            .zip(lane.iter())
            .for_each(|(b, &x)| *b = x);
        plan.process(&mut buffer);
        lane.iter_mut()
            .zip(buffer.iter())
            .for_each(|(x, &b)| *x = b);
    }
}

pub trait FFT2 {
    fn fft2_planned(self, planner: &mut FftPlanner<f64>) -> Array2<Complex64>;
    fn fft2(self) -> Array2<Complex64>;
    // Forward transform with the zero frequency moved to the centre, ready to plot.
    fn fft2_plottable(self) -> Array2<Complex64>;
}

impl FFT2 for Array2<f64> {
    fn fft2_planned(self, planner: &mut FftPlanner<f64>) -> Array2<Complex64> {
        self.mapv(|x| Complex64::new(x, 0.)).fft2_planned(planner)
    }

    fn fft2(self) -> Array2<Complex64> {
        self.mapv(|x| Complex64::new(x, 0.)).fft2()
    }

    fn fft2_plottable(self) -> Array2<Complex64> {
        self.mapv(|x| Complex64::new(x, 0.)).fft2_plottable()
    }
}

impl FFT2 for Array2<Complex64> {
    fn fft2_planned(mut self, planner: &mut FftPlanner<f64>) -> Array2<Complex64> {
        let (rows, cols) = self.dim();
        if rows == 0 || cols == 0 {
            return self;
        }

        let row_plan = planner.plan_fft_forward(cols);
        transform_lanes(&mut self, Axis(1), &row_plan);

        let col_plan = planner.plan_fft_forward(rows);
        transform_lanes(&mut self, Axis(0), &col_plan);

        self
    }

    fn fft2(self) -> Array2<Complex64> {
        let mut planner = FftPlanner::new();
        self.fft2_planned(&mut planner)
    }

    fn fft2_plottable(self) -> Array2<Complex64> {
        fftshift(&self.fft2())
    }
}
