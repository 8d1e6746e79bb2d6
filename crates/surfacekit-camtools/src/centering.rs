//! Path centering
//!
//! Moves a program so that a chosen point of its XY bounding box lands on a
//! target position.

use surfacekit_core::{Anchor, Extent};
use surfacekit_gcode::{CommandSequence, MotionCommand};

/// Translates programs so an anchor of their bounding box sits on a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathCentering {
    pub anchor: Anchor,
    pub target: (f64, f64),
}

impl Default for PathCentering {
    fn default() -> Self {
        Self::new(Anchor::Center)
    }
}

impl PathCentering {
    /// Centering on `anchor` with the origin as target
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            target: (0.0, 0.0),
        }
    }

    pub fn with_target(mut self, x: f64, y: f64) -> Self {
        self.target = (x, y);
        self
    }

    /// Extents of the explicit X and Y words of all motion commands
    pub fn extents(sequence: &CommandSequence) -> (Option<Extent>, Option<Extent>) {
        let coords = || sequence.iter().filter_map(MotionCommand::coordinate);
        (
            Extent::from_values(coords().filter_map(|c| c.x)),
            Extent::from_values(coords().filter_map(|c| c.y)),
        )
    }

    /// Translation that moves the anchor onto the target.
    ///
    /// An axis without any explicit value is not moved. Returns `None` when
    /// the program has no X or Y words at all.
    pub fn offset(&self, sequence: &CommandSequence) -> Option<(f64, f64)> {
        let (x, y) = Self::extents(sequence);
        if x.is_none() && y.is_none() {
            return None;
        }

        let (fx, fy) = self.anchor.fractions();
        let dx = x.map_or(0.0, |e| self.target.0 - e.at(fx));
        let dy = y.map_or(0.0, |e| self.target.1 - e.at(fy));
        Some((dx, dy))
    }

    /// Translated copy of `sequence`.
    ///
    /// Only explicit X and Y words move; I and J are relative to the arc
    /// start and stay as they are.
    pub fn apply(&self, sequence: &CommandSequence) -> CommandSequence {
        let Some((dx, dy)) = self.offset(sequence) else {
            tracing::debug!("No XY coordinates to center");
            return sequence.clone();
        };
        tracing::info!(
            "Centering on {} anchor: offset ({:.4}, {:.4})",
            self.anchor,
            dx,
            dy
        );

        let mut centered = sequence.clone();
        for command in centered.iter_mut() {
            if let Some(line) = command.motion_mut() {
                let c = &mut line.coordinate;
                c.x = c.x.map(|x| x + dx);
                c.y = c.y.map(|y| y + dy);
            }
        }
        centered
    }
}
