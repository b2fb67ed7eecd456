// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GapError {
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("Geometry at index {index} is not a usable point: {reason}")]
    InvalidGeometry { index: usize, reason: String },
}

impl GapError {
    pub(crate) fn positive(name: &'static str, value: f64) -> Result<(), GapError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(GapError::InvalidParameter {
                name,
                value,
                reason: "must be a finite number greater than zero",
            })
        }
    }

    pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<(), GapError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(GapError::InvalidParameter {
                name,
                value,
                reason: "must be a finite number of at least zero",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rejects_zero_and_nan() {
        assert!(GapError::positive("x_bin_size", 0.5).is_ok());
        assert!(GapError::positive("x_bin_size", 0.0).is_err());
        assert!(GapError::positive("x_bin_size", -1.0).is_err());
        assert!(GapError::positive("x_bin_size", f64::NAN).is_err());
    }

    #[test]
    fn test_non_negative_allows_zero() {
        assert!(GapError::non_negative("alpha", 0.0).is_ok());
        assert!(GapError::non_negative("alpha", -0.1).is_err());
        assert!(GapError::non_negative("alpha", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_message_names_parameter() {
        let err = GapError::positive("y_gap_len_threshold", -2.0).unwrap_err();
        assert!(err.to_string().contains("y_gap_len_threshold"));
    }
}
