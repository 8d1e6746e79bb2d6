//! # SurfaceKit Height Map
//!
//! Surface representations used to conform toolpaths:
//! - Probe section files and the [`HeightGrid`] built from them
//! - Neighbour smoothing of probe spikes
//! - Triangle meshes ([`SurfaceMesh`]) with STL import and export
//! - The [`HeightSampler`] trait and the [`HeightField`] enum
//! - A background [`SectionRecorder`] for capturing probe readings

pub mod grid;
pub mod mesh;
pub mod recorder;
pub mod sampler;
pub mod sections;
pub mod smoothing;

pub use grid::HeightGrid;
pub use mesh::{SurfaceMesh, Triangle3D};
pub use recorder::{
    read_line_lossy, RecorderConfig, RecorderHandle, RecorderStats, SectionRecorder,
};
pub use sampler::{HeightField, HeightSampler};
pub use sections::{section_header, HeightSections, DEFAULT_SECTION_MARKER};
pub use smoothing::{is_smooth, smooth, SmoothingParams, SmoothingReport};
