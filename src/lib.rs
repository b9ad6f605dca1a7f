pub mod aperture;
pub mod diffraction;
pub mod error;
pub mod fft;
pub mod grid;
pub mod plot;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::{Error, Result};
