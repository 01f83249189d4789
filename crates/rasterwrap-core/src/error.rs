//! Error handling for rasterwrap
//!
//! Parameter errors shared by every layer of the workspace: caller
//! contract violations caught at entry. I/O and image errors belong to the
//! crates that perform the I/O.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Parameter error type
///
/// Raised when process or tracer parameters violate their preconditions.
/// The arithmetic core never produces these; they are checked once, at
/// construction or at the entry of a tracing pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A value must be finite and strictly positive
    #[error("Parameter '{name}' must be finite and > 0, got {value}")]
    NotPositive {
        /// The parameter name.
        name: String,
        /// The rejected value.
        value: f64,
    },

    /// A value is out of its valid range
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        /// The parameter name.
        name: String,
        /// The rejected value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Grid dimensions do not match the requested trace
    #[error("Grid mismatch: {reason}")]
    GridMismatch {
        /// Why the grid cannot be traced.
        reason: String,
    },

    /// Parameters are mutually incompatible
    #[error("Incompatible parameters: {0}")]
    Incompatible(String),
}

impl ParameterError {
    /// Check that `value` is finite and strictly positive.
    pub fn check_positive(name: &str, value: f64) -> ParameterResult<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ParameterError::NotPositive {
                name: name.to_string(),
                value,
            })
        }
    }

    /// Check that `value` lies in `[min, max]`.
    pub fn check_range(name: &str, value: f64, min: f64, max: f64) -> ParameterResult<f64> {
        if value.is_finite() && value >= min && value <= max {
            Ok(value)
        } else {
            Err(ParameterError::OutOfRange {
                name: name.to_string(),
                value,
                min,
                max,
            })
        }
    }
}

/// Result type alias for parameter validation.
pub type ParameterResult<T> = std::result::Result<T, ParameterError>;
