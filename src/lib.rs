//! # SurfaceKit
//!
//! Drapes flat-bed G-code toolpaths onto scanned or meshed surfaces:
//! - Tolerant line-oriented G-code parsing and canonical regeneration
//! - Linear and arc interpolation into dense point sequences
//! - Height fields from probe section files or STL meshes
//! - Spike smoothing, mesh export and live section recording
//! - Program centering, duplicate removal and line-pattern generation
//!
//! ## Architecture
//!
//! SurfaceKit is organized as a workspace with multiple crates:
//!
//! 1. **surfacekit-core** - Geometry, anchors, errors, atomic file I/O
//! 2. **surfacekit-gcode** - Command model, parser, interpolation, generator
//! 3. **surfacekit-heightmap** - Grids, sections, smoothing, meshes, recorder
//! 4. **surfacekit-camtools** - Surface conforming, centering, generators, jobs
//! 5. **surfacekit-settings** - Configuration model and persistence
//! 6. **surfacekit** - This crate: command implementations and the CLI binary

pub mod commands;

pub use surfacekit_core::{Anchor, BoundingBox2D, Error, Point3D, Result, SurfaceError};

pub use surfacekit_gcode::{
    CommandSequence, Coordinate, GcodeFileReader, GcodeGenerator, GcodeParser, Interpolator,
    MachinePosition, MotionCommand, MotionLine, OutputPrecision,
};

pub use surfacekit_heightmap::{
    HeightField, HeightGrid, HeightSampler, HeightSections, RecorderConfig, SectionRecorder,
    SmoothingParams, SmoothingReport, SurfaceMesh,
};

pub use surfacekit_camtools::{
    CamToolError, GCodeOptimizer, JobSummary, LinePatternGenerator, LinePatternParameters,
    PathCentering, SectionSurface, SurfaceConformer, SurfaceJob, SurfaceSource,
};

pub use surfacekit_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, keeping stdout free for command output
/// - RUST_LOG environment variable support, `info` otherwise
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
