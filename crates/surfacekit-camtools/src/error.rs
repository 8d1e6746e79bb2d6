//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for surface conforming,
//! program generation and parameter validation.

use surfacekit_core::SurfaceError;
use thiserror::Error;

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Invalid parameters were provided to a CAM tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The height field could not answer a query.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Loading or saving a file failed.
    #[error(transparent)]
    Core(#[from] surfacekit_core::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors related to CAM tool parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ParameterError {
    /// Error for a value that must be strictly positive
    pub fn not_positive(name: &str, value: f64) -> Self {
        ParameterError::InvalidValue {
            name: name.to_string(),
            reason: format!("must be greater than zero, got {}", value),
        }
    }
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cam_tool_error_display() {
        let err = CamToolError::InvalidParameters("steps must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid parameters: steps must be positive");

        let err = CamToolError::from(SurfaceError::NoSurfaceData);
        assert_eq!(err.to_string(), "Height field has no surface data");
    }

    #[test]
    fn test_parameter_error_display() {
        let err = ParameterError::OutOfRange {
            name: "line_count".to_string(),
            value: 0.0,
            min: 1.0,
            max: 10000.0,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'line_count' out of range: 0 (valid: 1..10000)"
        );

        let err = ParameterError::not_positive("x_length", -5.0);
        assert_eq!(
            err.to_string(),
            "Invalid value for 'x_length': must be greater than zero, got -5"
        );
    }

    #[test]
    fn test_parameter_error_converts() {
        let err: CamToolError = ParameterError::not_positive("line_spacing", 0.0).into();
        assert!(matches!(err, CamToolError::Parameter(_)));
        assert_eq!(
            err.to_string(),
            "Parameter error: Invalid value for 'line_spacing': must be greater than zero, got 0"
        );
    }
}
