#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid parameter `{name}`: {value} (must be strictly positive and finite)")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("amplitude has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("plotting failed: {0}")]
    Plot(String),
    #[error("viewer failed: {0}")]
    Viewer(String),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// Rejects zero, negative, NaN and infinite values.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0. {
        Ok(value)
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod test {
    use super::{ensure_positive, Error};

    #[test]
    fn rejects_non_positive_and_non_finite() {
        assert_eq!(ensure_positive("width", 0.1).unwrap(), 0.1);
        for bad in [0., -1., f64::NAN, f64::INFINITY] {
            match ensure_positive("width", bad) {
                Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "width"),
                other => panic!("expected InvalidParameter, got {:?}", other),
            }
        }
    }

    #[test]
    fn io_errors_keep_their_cause_in_the_message() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let message = err.to_string();
        assert!(message.starts_with("failed to write output"));
        assert!(message.contains("disk full"), "{}", message);
    }
}
