use std::path::PathBuf;

use diffraction_lib::{
    aperture::ApertureKind,
    diffraction::{DiffractionCalculator, DiffractionPattern, Parameters, PatternSink},
    plot::{DiffractionFigure, PngSink},
};
use ndarray::Array2;
use strum::IntoEnumIterator;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "diffraction",
    about = "Fraunhofer diffraction patterns of simple apertures"
)]
struct Opt {
    /// Propagation distance to the observation plane [m]
    #[structopt(long, default_value = "0.5")]
    distance: f64,
    /// Illumination wavelength [m]
    #[structopt(long, default_value = "600e-9")]
    wavelength: f64,
    /// Samples per axis of the aperture plane
    #[structopt(long, default_value = "1000")]
    samples: usize,
    /// Side length of the sampled aperture plane [m]
    #[structopt(long, default_value = "0.5")]
    extent: f64,
    /// Only process these apertures (single_slit, rectangle, circular)
    #[structopt(short, long = "aperture")]
    apertures: Vec<ApertureKind>,
    /// Directory the PNG files are written to
    #[structopt(short, long, default_value = ".", parse(from_os_str))]
    output: PathBuf,
    /// Display the patterns in a window once they are saved
    #[structopt(long)]
    show: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    let params = Parameters {
        distance: opt.distance,
        wavelength: opt.wavelength,
        samples: opt.samples,
        extent: opt.extent,
    };
    log::debug!("{:?}", params);

    let kinds: Vec<ApertureKind> = if opt.apertures.is_empty() {
        ApertureKind::iter().collect()
    } else {
        opt.apertures.clone()
    };
    let calculator = DiffractionCalculator::with_apertures(params, kinds)?;

    let mut png = PngSink::new(&opt.output)?;
    let mut figures = Vec::new();
    calculator.process_all_apertures(
        &mut |kind: ApertureKind,
              amplitude: &Array2<f64>,
              pattern: &DiffractionPattern|
              -> diffraction_lib::Result<()> {
            png.consume(kind, amplitude, pattern)?;
            if opt.show {
                figures.push((kind, DiffractionFigure::new(amplitude, pattern)));
            }
            Ok(())
        },
    )?;

    if opt.show {
        #[cfg(feature = "viewer")]
        diffraction_lib::viewer::show(figures)?;
        #[cfg(not(feature = "viewer"))]
        log::warn!(
            "--show ignored for {} patterns: built without the `viewer` feature",
            figures.len()
        );
    }

    Ok(())
}
