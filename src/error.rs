//! Contains the error type returned by fallible quantization functions.

use crate::AboveMaxLen;
use std::{error::Error, fmt};

/// The error type for building and querying a color tree and for the pipelines built on top of it.
#[derive(Debug)]
pub enum QuantizeError {
    /// A configuration value was rejected when constructing a tree or pipeline.
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The tree's bookkeeping is inconsistent.
    ///
    /// This signals a bug rather than bad input and aborts quantization of the current image.
    Invariant {
        /// The operation that detected the inconsistency.
        operation: &'static str,
        /// What was inconsistent.
        reason: String,
    },

    /// The input has more pixels than [`MAX_PIXELS`](crate::MAX_PIXELS).
    TooManyPixels(AboveMaxLen<u32>),

    /// A pixel buffer does not match the image dimensions it was given with.
    DimensionMismatch {
        /// `width * height`.
        expected: usize,
        /// The number of pixels provided.
        actual: usize,
    },

    /// The `image` crate failed to decode or encode an image.
    #[cfg(feature = "image")]
    Image(image::ImageError),
}

impl fmt::Display for QuantizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { parameter, value, reason } => {
                write!(f, "invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::Invariant { operation, reason } => {
                write!(f, "internal invariant violated during {operation}: {reason}")
            }
            Self::TooManyPixels(err) => write!(f, "too many pixels: {err}"),
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} pixels but got {actual}")
            }
            #[cfg(feature = "image")]
            Self::Image(err) => write!(f, "image error: {err}"),
        }
    }
}

impl Error for QuantizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TooManyPixels(err) => Some(err),
            #[cfg(feature = "image")]
            Self::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AboveMaxLen<u32>> for QuantizeError {
    fn from(err: AboveMaxLen<u32>) -> Self {
        Self::TooManyPixels(err)
    }
}

#[cfg(feature = "image")]
impl From<image::ImageError> for QuantizeError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

/// Creates a [`QuantizeError::InvalidParameter`].
pub(crate) fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> QuantizeError {
    QuantizeError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a [`QuantizeError::Invariant`].
pub(crate) fn invariant(operation: &'static str, reason: &impl ToString) -> QuantizeError {
    QuantizeError::Invariant {
        operation,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PIXELS;

    #[test]
    fn messages_name_the_parameter() {
        let err = invalid_parameter("max_depth", &9, &"must be in 1..=8");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'max_depth' = '9': must be in 1..=8"
        );
    }

    #[test]
    fn above_max_len_is_the_source() {
        let err = QuantizeError::from(AboveMaxLen(MAX_PIXELS));
        assert!(err.source().is_some());
        assert!(invariant("reduce", &"empty").source().is_none());
    }
}
