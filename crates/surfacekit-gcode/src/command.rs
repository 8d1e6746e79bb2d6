//! G-Code command model
//!
//! A program is a [`CommandSequence`] of [`MotionCommand`]s. Motion commands
//! carry a [`Coordinate`] whose fields are individually optional: an absent
//! field means "not specified on this line", which is not the same as zero.

use serde::{Deserialize, Serialize};
use surfacekit_core::{ArcDirection, Point3D};

/// Word values of a single motion line
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// Feed rate
    pub f: Option<f64>,
    /// Spindle speed
    pub s: Option<f64>,
    /// Arc center offset in X, relative to the arc start
    pub i: Option<f64>,
    /// Arc center offset in Y, relative to the arc start
    pub j: Option<f64>,
}

impl Coordinate {
    /// Create an empty coordinate (every field absent)
    pub fn new() -> Self {
        Self::default()
    }

    /// Coordinate with explicit X, Y and Z
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
            ..Self::default()
        }
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_feed(mut self, f: f64) -> Self {
        self.f = Some(f);
        self
    }

    pub fn with_spindle(mut self, s: f64) -> Self {
        self.s = Some(s);
        self
    }

    pub fn with_center_offset(mut self, i: f64, j: f64) -> Self {
        self.i = Some(i);
        self.j = Some(j);
        self
    }

    /// Fill absent axes from `current`
    pub fn resolve(&self, current: Point3D) -> Point3D {
        Point3D::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
        )
    }

    /// True if any of X, Y or Z is present
    pub fn has_axis(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }
}

/// A motion line: its coordinate and any trailing comment, kept verbatim
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionLine {
    pub coordinate: Coordinate,
    /// Comment text including its delimiter, e.g. `; plunge` or `(finish)`
    pub comment: Option<String>,
}

impl MotionLine {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One line of a toolpath program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// G0 rapid positioning
    Rapid(MotionLine),
    /// G1 linear cut
    Linear(MotionLine),
    /// G2 clockwise arc
    ArcCw(MotionLine),
    /// G3 counter-clockwise arc
    ArcCcw(MotionLine),
    /// Any other line, kept exactly as read
    Other(String),
}

impl MotionCommand {
    pub fn rapid(coordinate: Coordinate) -> Self {
        MotionCommand::Rapid(MotionLine::new(coordinate))
    }

    pub fn linear(coordinate: Coordinate) -> Self {
        MotionCommand::Linear(MotionLine::new(coordinate))
    }

    /// The motion line, if this is a motion command
    pub fn motion(&self) -> Option<&MotionLine> {
        match self {
            MotionCommand::Rapid(line)
            | MotionCommand::Linear(line)
            | MotionCommand::ArcCw(line)
            | MotionCommand::ArcCcw(line) => Some(line),
            MotionCommand::Other(_) => None,
        }
    }

    pub fn motion_mut(&mut self) -> Option<&mut MotionLine> {
        match self {
            MotionCommand::Rapid(line)
            | MotionCommand::Linear(line)
            | MotionCommand::ArcCw(line)
            | MotionCommand::ArcCcw(line) => Some(line),
            MotionCommand::Other(_) => None,
        }
    }

    pub fn coordinate(&self) -> Option<&Coordinate> {
        self.motion().map(|line| &line.coordinate)
    }

    /// Canonical G word for motion commands
    pub fn g_word(&self) -> Option<&'static str> {
        match self {
            MotionCommand::Rapid(_) => Some("G0"),
            MotionCommand::Linear(_) => Some("G1"),
            MotionCommand::ArcCw(_) => Some("G2"),
            MotionCommand::ArcCcw(_) => Some("G3"),
            MotionCommand::Other(_) => None,
        }
    }

    pub fn arc_direction(&self) -> Option<ArcDirection> {
        match self {
            MotionCommand::ArcCw(_) => Some(ArcDirection::Clockwise),
            MotionCommand::ArcCcw(_) => Some(ArcDirection::CounterClockwise),
            _ => None,
        }
    }

    pub fn is_motion(&self) -> bool {
        self.motion().is_some()
    }
}

/// An ordered toolpath program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandSequence {
    commands: Vec<MotionCommand>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, command: MotionCommand) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = MotionCommand>) {
        self.commands.extend(commands);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[MotionCommand] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MotionCommand> {
        self.commands.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, MotionCommand> {
        self.commands.iter_mut()
    }

    /// Number of motion (non-`Other`) commands
    pub fn motion_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_motion()).count()
    }

    pub fn into_inner(self) -> Vec<MotionCommand> {
        self.commands
    }
}

impl From<Vec<MotionCommand>> for CommandSequence {
    fn from(commands: Vec<MotionCommand>) -> Self {
        Self { commands }
    }
}

impl FromIterator<MotionCommand> for CommandSequence {
    fn from_iter<T: IntoIterator<Item = MotionCommand>>(iter: T) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CommandSequence {
    type Item = MotionCommand;
    type IntoIter = std::vec::IntoIter<MotionCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandSequence {
    type Item = &'a MotionCommand;
    type IntoIter = std::slice::Iter<'a, MotionCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
