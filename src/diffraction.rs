use std::collections::BTreeMap;

use ndarray::Array2;
use strum::IntoEnumIterator;

use crate::{
    aperture::ApertureKind,
    error::{ensure_positive, Error, Result},
    fft::{fftfreq_plottable, FFT2},
    grid::{meshgrid, CoordinateGrid},
};

pub const DEFAULT_DISTANCE: f64 = 0.5;
pub const DEFAULT_WAVELENGTH: f64 = 600e-9;
pub const DEFAULT_SAMPLES: usize = 1000;
pub const DEFAULT_EXTENT: f64 = 0.5;

/// Physical setup of one simulation. All lengths are in metres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Parameters {
    /// Propagation distance L from the aperture to the observation plane.
    pub distance: f64,
    pub wavelength: f64,
    /// Samples N per axis of the aperture plane.
    pub samples: usize,
    /// Side length D of the sampled aperture plane.
    pub extent: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            distance: DEFAULT_DISTANCE,
            wavelength: DEFAULT_WAVELENGTH,
            samples: DEFAULT_SAMPLES,
            extent: DEFAULT_EXTENT,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("distance", self.distance)?;
        ensure_positive("wavelength", self.wavelength)?;
        ensure_positive("extent", self.extent)?;
        if self.samples == 0 {
            return Err(Error::InvalidParameter {
                name: "samples",
                value: 0.,
            });
        }
        Ok(())
    }

    // Sample spacing used for the frequency axes. This is D / N, not the linspace step.
    pub fn dx(&self) -> f64 {
        self.extent / self.samples as f64
    }
}

/// Far-field intensity and the observation-plane coordinates of each sample.
#[derive(Clone, Debug)]
pub struct DiffractionPattern {
    pub intensity: Array2<f64>,
    pub x_far: Array2<f64>,
    pub y_far: Array2<f64>,
    /// Largest magnitude of the centred transform, i.e. `sqrt(max intensity)`.
    pub peak_magnitude: f64,
}

impl DiffractionPattern {
    // (min x, max x, min y, max y) of the observation plane.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let min_max = |a: &Array2<f64>| {
            a.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
        };
        let (x0, x1) = min_max(&self.x_far);
        let (y0, y1) = min_max(&self.y_far);
        (x0, x1, y0, y1)
    }

    // Index of the brightest sample. Ties keep the first one in row-major order.
    #[cfg(test)]
    pub(crate) fn peak_index(&self) -> (usize, usize) {
        let mut best = ((0, 0), f64::NEG_INFINITY);
        for (idx, &v) in self.intensity.indexed_iter() {
            if v > best.1 {
                best = (idx, v);
            }
        }
        best.0
    }
}

/// Consumer of computed patterns, such as a PNG writer or an interactive viewer.
pub trait PatternSink {
    fn consume(
        &mut self,
        kind: ApertureKind,
        amplitude: &Array2<f64>,
        pattern: &DiffractionPattern,
    ) -> Result<()>;
}

impl<F> PatternSink for F
where
    F: FnMut(ApertureKind, &Array2<f64>, &DiffractionPattern) -> Result<()>,
{
    fn consume(
        &mut self,
        kind: ApertureKind,
        amplitude: &Array2<f64>,
        pattern: &DiffractionPattern,
    ) -> Result<()> {
        self(kind, amplitude, pattern)
    }
}

pub struct DiffractionCalculator {
    params: Parameters,
    grid: CoordinateGrid,
    apertures: BTreeMap<ApertureKind, Array2<f64>>,
}

impl DiffractionCalculator {
    // Builds the grid and every built-in aperture mask up front.
    pub fn new(params: Parameters) -> Result<DiffractionCalculator> {
        Self::with_apertures(params, ApertureKind::iter())
    }

    // Like `new`, but only precomputes the listed apertures.
    pub fn with_apertures(
        params: Parameters,
        kinds: impl IntoIterator<Item = ApertureKind>,
    ) -> Result<DiffractionCalculator> {
        params.validate()?;

        let grid = CoordinateGrid::new(params.samples, params.extent);
        let apertures = kinds
            .into_iter()
            .map(|kind| -> Result<_> { Ok((kind, kind.shape(params.extent)?.mask(&grid))) })
            .collect::<Result<_>>()?;

        log::debug!(
            "grid {n}x{n} over {d} m, dx = {dx:e} m",
            n = params.samples,
            d = params.extent,
            dx = params.dx()
        );

        Ok(DiffractionCalculator {
            params,
            grid,
            apertures,
        })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    pub fn aperture(&self, kind: ApertureKind) -> Option<&Array2<f64>> {
        self.apertures.get(&kind)
    }

    // Masks in processing order.
    pub fn apertures(&self) -> impl Iterator<Item = (ApertureKind, &Array2<f64>)> {
        self.apertures.iter().map(|(&kind, mask)| (kind, mask))
    }

    fn far_field_axis(&self) -> ndarray::Array1<f64> {
        let Parameters {
            distance,
            wavelength,
            samples,
            ..
        } = self.params;
        // Spatial frequency times wavelength times distance gives a length on the screen.
        fftfreq_plottable(samples, self.params.dx()) * (wavelength * distance)
    }

    pub fn compute_fraunhofer_diffraction(
        &self,
        amplitude: &Array2<f64>,
    ) -> Result<DiffractionPattern> {
        let expected = self.grid.dim();
        if amplitude.dim() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                found: amplitude.dim(),
            });
        }

        let field = amplitude.clone().fft2_plottable();

        let intensity = field.mapv(|z| z.norm_sqr());
        let peak_magnitude = intensity.iter().copied().fold(0., f64::max).sqrt();
        log::info!("Maximum magnitude after FFT: {}", peak_magnitude);

        let axis = self.far_field_axis();
        let (x_far, y_far) = meshgrid(&axis, &axis);

        Ok(DiffractionPattern {
            intensity,
            x_far,
            y_far,
            peak_magnitude,
        })
    }

    // Runs every aperture through the transform in order, handing each result to `sink`.
    // Stops at the first failure.
    pub fn process_all_apertures(&self, sink: &mut impl PatternSink) -> Result<()> {
        for (kind, amplitude) in self.apertures() {
            log::debug!("processing {}", kind);
            let pattern = self.compute_fraunhofer_diffraction(amplitude)?;
            sink.consume(kind, amplitude, &pattern)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::Array2;

    use crate::{aperture::ApertureKind, error::Error, fft::FFT2};

    use super::{DiffractionCalculator, DiffractionPattern, Parameters};

    fn small(samples: usize) -> Parameters {
        Parameters {
            distance: 0.5,
            wavelength: 600e-9,
            samples,
            extent: 0.5,
        }
    }

    #[test]
    fn defaults() {
        let p = Parameters::default();
        assert_eq!(p.samples, 1000);
        assert_relative_eq!(p.dx(), 5e-4);
        assert_relative_eq!(p.wavelength, 6e-7);
    }

    #[test]
    fn builds_all_named_apertures() {
        let calc = DiffractionCalculator::new(small(32)).unwrap();
        assert_eq!(calc.grid().dim(), (32, 32));
        assert_eq!(calc.parameters(), &small(32));
        let kinds: Vec<_> = calc.apertures().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                ApertureKind::SingleSlit,
                ApertureKind::Rectangle,
                ApertureKind::Circular
            ]
        );
        for (_, mask) in calc.apertures() {
            assert_eq!(mask.dim(), (32, 32));
            assert!(mask.iter().all(|&v| v == 0. || v == 1.));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut p = small(0);
        assert!(matches!(
            DiffractionCalculator::new(p),
            Err(Error::InvalidParameter {
                name: "samples",
                ..
            })
        ));
        p.samples = 8;
        p.extent = -0.5;
        assert!(matches!(
            DiffractionCalculator::new(p),
            Err(Error::InvalidParameter { name: "extent", .. })
        ));
        p.extent = 0.5;
        p.wavelength = 0.;
        assert!(DiffractionCalculator::new(p).is_err());
    }

    #[test]
    fn intensity_is_the_centred_power_spectrum() {
        let calc = DiffractionCalculator::new(small(6)).unwrap();
        let amplitude = Array2::from_shape_fn((6, 6), |(i, j)| ((i * 7 + j * 3) % 5) as f64);
        let pattern = calc.compute_fraunhofer_diffraction(&amplitude).unwrap();
        let expected = amplitude.fft2_plottable().mapv(|z| z.norm_sqr());
        assert_relative_eq!(pattern.intensity, expected, epsilon = 1e-9);
    }

    #[test]
    fn rejects_mismatched_amplitude() {
        let calc = DiffractionCalculator::new(small(8)).unwrap();
        match calc.compute_fraunhofer_diffraction(&Array2::ones((8, 4))) {
            Err(Error::ShapeMismatch { expected, found }) => {
                assert_eq!(expected, (8, 8));
                assert_eq!(found, (8, 4));
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn uniform_amplitude_peaks_at_centre() {
        let n = 16;
        let calc = DiffractionCalculator::new(small(n)).unwrap();
        let pattern = calc
            .compute_fraunhofer_diffraction(&Array2::ones((n, n)))
            .unwrap();
        assert_eq!(pattern.peak_index(), (n / 2, n / 2));
        assert_eq!(pattern.x_far[[n / 2, n / 2]], 0.);
        assert_eq!(pattern.y_far[[n / 2, n / 2]], 0.);
        assert_relative_eq!(pattern.peak_magnitude, (n * n) as f64, epsilon = 1e-9);
    }

    #[test]
    fn intensity_is_non_negative() {
        let calc = DiffractionCalculator::new(small(24)).unwrap();
        for (_, mask) in calc.apertures() {
            let pattern = calc.compute_fraunhofer_diffraction(mask).unwrap();
            assert!(pattern.intensity.iter().all(|&v| v >= 0.));
        }
    }

    #[test]
    fn far_field_axes_pair_up_around_zero() {
        let n = 10;
        let calc = DiffractionCalculator::new(small(n)).unwrap();
        let mask = calc.aperture(ApertureKind::Rectangle).unwrap();
        let pattern = calc.compute_fraunhofer_diffraction(mask).unwrap();

        let x = pattern.x_far.row(0);
        let y = pattern.y_far.column(0);
        for i in 1..n {
            assert_relative_eq!(x[i], -x[n - i], epsilon = 1e-15);
            assert_relative_eq!(y[i], -y[n - i], epsilon = 1e-15);
        }
        // Bin spacing is wavelength * L / D.
        assert_relative_eq!(x[1] - x[0], 600e-9 * 0.5 / 0.5, epsilon = 1e-15);
        // x is constant down columns, y along rows.
        assert_eq!(pattern.x_far.column(3).iter().filter(|&&v| v != x[3]).count(), 0);
        assert_eq!(pattern.y_far.row(3).iter().filter(|&&v| v != y[3]).count(), 0);
    }

    #[test]
    fn small_circular_end_to_end() {
        let calc = DiffractionCalculator::new(small(8)).unwrap();
        let mask = calc.aperture(ApertureKind::Circular).unwrap();
        let pattern = calc.compute_fraunhofer_diffraction(mask).unwrap();

        assert_eq!(pattern.intensity.dim(), (8, 8));
        assert_eq!(pattern.x_far.dim(), (8, 8));
        assert_eq!(pattern.y_far.dim(), (8, 8));
        assert_eq!(pattern.peak_index(), (4, 4));
        // The DC term is the open area in samples.
        assert_relative_eq!(pattern.peak_magnitude, mask.sum(), epsilon = 1e-9);

        let (x0, x1, y0, y1) = pattern.extent();
        assert_relative_eq!(x0, -4. * 600e-9, epsilon = 1e-15);
        assert_relative_eq!(x1, 3. * 600e-9, epsilon = 1e-15);
        assert_relative_eq!(y0, x0);
        assert_relative_eq!(y1, x1);
    }

    #[test]
    fn processes_every_aperture_in_order() {
        let calc = DiffractionCalculator::new(small(8)).unwrap();
        let mut seen = Vec::new();
        calc.process_all_apertures(
            &mut |kind: ApertureKind,
                  amplitude: &Array2<f64>,
                  pattern: &DiffractionPattern|
                  -> Result<(), Error> {
                assert_eq!(amplitude.dim(), pattern.intensity.dim());
                seen.push(kind);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(
            seen,
            vec![
                ApertureKind::SingleSlit,
                ApertureKind::Rectangle,
                ApertureKind::Circular
            ]
        );
    }

    #[test]
    fn sink_failure_stops_the_run() {
        let calc = DiffractionCalculator::new(small(8)).unwrap();
        let mut calls = 0;
        let result = calc.process_all_apertures(
            &mut |_: ApertureKind, _: &Array2<f64>, _: &DiffractionPattern| -> Result<(), Error> {
                calls += 1;
                Err(Error::Plot("no backend".to_owned()))
            },
        );
        assert!(matches!(result, Err(Error::Plot(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn subset_of_apertures() {
        let calc =
            DiffractionCalculator::with_apertures(small(8), vec![ApertureKind::Circular]).unwrap();
        assert!(calc.aperture(ApertureKind::SingleSlit).is_none());
        assert_abs_diff_eq!(calc.aperture(ApertureKind::Circular).unwrap().sum(), 32.);
    }
}
