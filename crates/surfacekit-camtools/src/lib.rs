//! # SurfaceKit CAM Tools
//!
//! Toolpath transformations built on the G-code and height-map crates:
//! - Surface conforming of flat toolpaths
//! - Path centering on a bounding-box anchor
//! - Duplicate line removal
//! - Line pattern program generation
//! - A job runner tying the pipeline together

pub mod centering;
pub mod error;
pub mod job;
pub mod line_pattern;
pub mod optimizer;
pub mod surface_conform;

pub use centering::PathCentering;
pub use error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
pub use job::{JobSummary, SectionSurface, SurfaceJob, SurfaceSource};
pub use line_pattern::{LinePatternGenerator, LinePatternParameters};
pub use optimizer::GCodeOptimizer;
pub use surface_conform::{ConformState, ContactState, SurfaceConformer};
