//! # SurfaceKit Core
//!
//! Core types and utilities shared by the SurfaceKit crates:
//! geometry primitives, unified error types and boundary file I/O.

pub mod error;
pub mod file_io;
pub mod geometry;

pub use error::{Error, Result, SurfaceError};
pub use file_io::{read_text, write_atomic, write_atomic_with};
pub use geometry::{Anchor, ArcDirection, ArcSweep, BoundingBox2D, Extent, Point3D};
