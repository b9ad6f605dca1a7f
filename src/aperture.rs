use ndarray::{Array2, Zip};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    error::{ensure_positive, Result},
    grid::CoordinateGrid,
};

pub const DEFAULT_SLIT_WIDTH: f64 = 0.1;
pub const DEFAULT_RECTANGLE_WIDTH: f64 = 0.1;
pub const DEFAULT_RECTANGLE_HEIGHT: f64 = 0.2;
pub const DEFAULT_DIAMETER: f64 = 1.0;

fn transmission(open: bool) -> f64 {
    if open {
        1.
    } else {
        0.
    }
}

fn mask_from(x: &Array2<f64>, y: &Array2<f64>, open: impl Fn(f64, f64) -> bool) -> Array2<f64> {
    Zip::from(x)
        .and(y)
        .map_collect(|&x, &y| transmission(open(x, y)))
}

// Infinite slit along y: only the x coordinate matters.
pub fn create_single_slit(x: &Array2<f64>, y: &Array2<f64>, width: f64) -> Array2<f64> {
    mask_from(x, y, |x, _| x.abs() <= width / 2.)
}

pub fn create_rectangle(x: &Array2<f64>, y: &Array2<f64>, width: f64, height: f64) -> Array2<f64> {
    mask_from(x, y, |x, y| x.abs() <= width / 2. && y.abs() <= height / 2.)
}

pub fn create_circular_aperture(x: &Array2<f64>, y: &Array2<f64>, diameter: f64) -> Array2<f64> {
    mask_from(x, y, |x, y| x.hypot(y) <= diameter / 2.)
}

/// A binary transmission function on the aperture plane.
///
/// Implementors decide which points pass light; the mask is that decision sampled on a
/// [CoordinateGrid], with 1 for open and 0 for opaque.
pub trait Aperture {
    fn transmits(&self, x: f64, y: f64) -> bool;

    fn mask(&self, grid: &CoordinateGrid) -> Array2<f64> {
        mask_from(&grid.x, &grid.y, |x, y| self.transmits(x, y))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SingleSlit {
    pub width: f64,
}

impl Default for SingleSlit {
    fn default() -> Self {
        SingleSlit {
            width: DEFAULT_SLIT_WIDTH,
        }
    }
}

impl SingleSlit {
    pub fn new(width: f64) -> Result<SingleSlit> {
        Ok(SingleSlit {
            width: ensure_positive("slit width", width)?,
        })
    }
}

impl Aperture for SingleSlit {
    fn transmits(&self, x: f64, _: f64) -> bool {
        x.abs() <= self.width / 2.
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
}

impl Default for Rectangle {
    fn default() -> Self {
        Rectangle {
            width: DEFAULT_RECTANGLE_WIDTH,
            height: DEFAULT_RECTANGLE_HEIGHT,
        }
    }
}

impl Rectangle {
    pub fn new(width: f64, height: f64) -> Result<Rectangle> {
        Ok(Rectangle {
            width: ensure_positive("rectangle width", width)?,
            height: ensure_positive("rectangle height", height)?,
        })
    }
}

impl Aperture for Rectangle {
    fn transmits(&self, x: f64, y: f64) -> bool {
        x.abs() <= self.width / 2. && y.abs() <= self.height / 2.
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circular {
    pub diameter: f64,
}

impl Default for Circular {
    fn default() -> Self {
        Circular {
            diameter: DEFAULT_DIAMETER,
        }
    }
}

impl Circular {
    pub fn new(diameter: f64) -> Result<Circular> {
        Ok(Circular {
            diameter: ensure_positive("diameter", diameter)?,
        })
    }
}

impl Aperture for Circular {
    fn transmits(&self, x: f64, y: f64) -> bool {
        x.hypot(y) <= self.diameter / 2.
    }
}

// The built-in apertures, declared in processing order. Names double as output file stems.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ApertureKind {
    SingleSlit,
    Rectangle,
    Circular,
}

impl ApertureKind {
    // The shape used for this kind on a plane of the given extent.
    // The circle fills the sampled window, the others use fixed sizes.
    pub fn shape(self, extent: f64) -> Result<Box<dyn Aperture>> {
        Ok(match self {
            ApertureKind::SingleSlit => Box::new(SingleSlit::new(DEFAULT_SLIT_WIDTH)?),
            ApertureKind::Rectangle => Box::new(Rectangle::new(
                DEFAULT_RECTANGLE_WIDTH,
                DEFAULT_RECTANGLE_HEIGHT,
            )?),
            ApertureKind::Circular => Box::new(Circular::new(extent)?),
        })
    }
}
