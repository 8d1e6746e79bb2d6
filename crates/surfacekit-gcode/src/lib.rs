//! # SurfaceKit G-Code
//!
//! Line-oriented G-code handling: the coordinate and command model, a
//! tolerant parser, linear and arc interpolation, and canonical line
//! generation.

pub mod command;
pub mod file_io;
pub mod generator;
pub mod interpolation;
pub mod parser;

pub use command::{CommandSequence, Coordinate, MotionCommand, MotionLine};
pub use file_io::{write_program, GcodeFileReader};
pub use generator::{format_value, GcodeGenerator, OutputPrecision};
pub use interpolation::{
    arc_points, interpolate_linear, Interpolator, DEFAULT_ARC_STEPS,
    DEFAULT_INTERPOLATION_STEPS, DEFAULT_VISUAL_ARC_STEPS,
};
pub use parser::{GcodeParser, MachinePosition, DEFAULT_START_POSITION};
