//! Error handling for SurfaceKit
//!
//! Provides the error types shared by every layer of the workspace:
//! - Surface errors (height-map construction and sampling)
//! - File I/O failures at the pipeline boundary
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Surface error type
///
/// Represents failures to build or query a height field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// Raw scan data contained no sections or no readings
    #[error("No height-map data in {origin}")]
    DataEmpty {
        /// Where the data came from (file path or a short description).
        origin: String,
    },

    /// A height field was queried but holds no usable samples
    #[error("Height field has no surface data")]
    NoSurfaceData,

    /// Grid dimensions or spacing are inconsistent
    #[error("Invalid height grid: {reason}")]
    InvalidGrid {
        /// Why the grid was rejected.
        reason: String,
    },
}

impl SurfaceError {
    /// Create a `DataEmpty` error for the given origin
    pub fn data_empty(origin: impl Into<String>) -> Self {
        SurfaceError::DataEmpty {
            origin: origin.into(),
        }
    }

    /// Create an `InvalidGrid` error
    pub fn invalid_grid(reason: impl Into<String>) -> Self {
        SurfaceError::InvalidGrid {
            reason: reason.into(),
        }
    }
}

/// Main error type for SurfaceKit
///
/// A unified error type that can represent any error from the library crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Surface error
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Reading or writing a file at the pipeline boundary failed
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        /// The file that could not be read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A parameter was outside its accepted range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an I/O error together with the path it concerns
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::IoFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a surface error
    pub fn is_surface_error(&self) -> bool {
        matches!(self, Error::Surface(_))
    }

    /// Check if this is a file I/O failure
    pub fn is_io_failure(&self) -> bool {
        matches!(self, Error::IoFailure { .. })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
