//! Surface conforming
//!
//! Drapes a toolpath written for a flat bed onto a measured surface. Cutting
//! moves are broken into short segments and every point is lifted to the
//! surface height below it. Rapids with an explicit Z are offset by the
//! surface height so clearance moves keep their distance above the work.

use serde::{Deserialize, Serialize};
use surfacekit_core::SurfaceError;
use surfacekit_gcode::{
    CommandSequence, Coordinate, Interpolator, MachinePosition, MotionCommand, MotionLine,
};
use surfacekit_heightmap::HeightSampler;

/// Whether the tool has touched the surface yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactState {
    /// No cutting point emitted yet
    AwaitingContact,
    /// At least one cutting point emitted
    InContact,
}

/// Fold state threaded through a conforming pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConformState {
    /// Position in the original, un-draped program
    pub position: MachinePosition,
    pub contact: ContactState,
}

impl ConformState {
    pub fn new(position: MachinePosition) -> Self {
        Self {
            position,
            contact: ContactState::AwaitingContact,
        }
    }
}

/// Rewrites toolpaths to follow a height field
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceConformer {
    interpolator: Interpolator,
}

impl SurfaceConformer {
    pub fn new(interpolator: Interpolator) -> Self {
        Self { interpolator }
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// Conform `sequence` to `surface`, starting at `start`.
    ///
    /// The first cutting point of the program is placed exactly on the
    /// surface. Every later cutting point is placed `|z|` below it, where `z`
    /// is the interpolated original depth. The input is left untouched.
    pub fn conform<S>(
        &self,
        sequence: &CommandSequence,
        surface: &S,
        start: MachinePosition,
    ) -> Result<CommandSequence, SurfaceError>
    where
        S: HeightSampler + ?Sized,
    {
        let mut output = CommandSequence::with_capacity(sequence.len());
        let mut state = ConformState::new(start);

        for command in sequence {
            state = self.step(state, command, surface, &mut output)?;
        }

        tracing::info!(
            "Conformed {} commands into {}",
            sequence.len(),
            output.len()
        );
        Ok(output)
    }

    fn step<S>(
        &self,
        state: ConformState,
        command: &MotionCommand,
        surface: &S,
        output: &mut CommandSequence,
    ) -> Result<ConformState, SurfaceError>
    where
        S: HeightSampler + ?Sized,
    {
        let from = state.position.point();
        let mut contact = state.contact;

        match command {
            MotionCommand::Other(_) => output.push(command.clone()),
            MotionCommand::Rapid(line) => match line.coordinate.z {
                Some(z) => {
                    let target = line.coordinate.resolve(from);
                    let height = surface.sample(target.x, target.y)?;
                    let mut lifted = line.clone();
                    lifted.coordinate.z = Some(z + height);
                    output.push(MotionCommand::Rapid(lifted));
                }
                None => output.push(command.clone()),
            },
            MotionCommand::Linear(line)
            | MotionCommand::ArcCw(line)
            | MotionCommand::ArcCcw(line) => {
                let points = self.interpolator.expand(from, command);
                for (index, point) in points.iter().enumerate() {
                    let (Some(x), Some(y)) = (point.x, point.y) else {
                        continue;
                    };
                    let height = surface.sample(x, y)?;
                    let z = match contact {
                        ContactState::AwaitingContact => {
                            contact = ContactState::InContact;
                            height
                        }
                        ContactState::InContact => height - point.z.unwrap_or(0.0).abs(),
                    };

                    let mut emitted = MotionLine::new(Coordinate {
                        z: Some(z),
                        ..*point
                    });
                    if index == 0 {
                        emitted.coordinate.s = line.coordinate.s;
                        emitted.comment = line.comment.clone();
                    }
                    output.push(MotionCommand::Linear(emitted));
                }
            }
        }

        Ok(ConformState {
            position: state.position.advance(command),
            contact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfacekit_gcode::GcodeParser;
    use surfacekit_heightmap::{HeightGrid, SurfaceMesh};

    fn flat(height: f64) -> HeightGrid {
        HeightGrid::filled(3, 3, height)
            .unwrap()
            .with_spacing(10.0, 10.0)
    }

    fn conform(text: &str, surface: &dyn HeightSampler) -> CommandSequence {
        let parser = GcodeParser::new();
        SurfaceConformer::new(Interpolator::new(10, 20))
            .conform(&parser.parse(text), surface, parser.start_position())
            .unwrap()
    }

    #[test]
    fn test_flat_surface_end_to_end() {
        let out = conform("G0 X0 Y0 Z1\nG1 X10 Y0 Z0 F100", &flat(5.0));
        assert_eq!(out.len(), 1 + 11);

        let rapid = out.commands()[0].coordinate().unwrap();
        assert_eq!(rapid.z, Some(6.0));

        let first = out.commands()[1].coordinate().unwrap();
        assert_eq!(first.z, Some(5.0));
        let last = out.commands()[11].coordinate().unwrap();
        assert_eq!(last.z, Some(5.0));
        assert_eq!(last.x, Some(10.0));
        assert_eq!(last.f, Some(100.0));
    }

    #[test]
    fn test_later_points_subtract_depth() {
        let out = conform("G0 Z-1\nG1 X10 Z-1", &flat(2.0));
        let zs: Vec<f64> = out
            .iter()
            .filter(|c| matches!(c, MotionCommand::Linear(_)))
            .filter_map(|c| c.coordinate().and_then(|c| c.z))
            .collect();
        assert_eq!(zs.len(), 11);
        assert_eq!(zs[0], 2.0);
        assert!(zs[1..].iter().all(|z| (*z - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_rapid_without_z_unchanged() {
        let out = conform("G0 X5 Y5", &flat(3.0));
        assert_eq!(out.commands()[0], GcodeParser::parse_line("G0 X5 Y5"));
    }

    #[test]
    fn test_rapid_emits_only_source_fields() {
        let out = conform("G0 Z2 ; clear", &flat(3.0));
        let line = out.commands()[0].motion().unwrap();
        assert_eq!(line.coordinate, Coordinate::new().with_z(5.0));
        assert_eq!(line.comment.as_deref(), Some("; clear"));
    }

    #[test]
    fn test_spindle_and_comment_on_first_point_only() {
        let out = conform("G1 X10 S9000 ; pass", &flat(0.0));
        let lines: Vec<&MotionLine> = out.iter().filter_map(|c| c.motion()).collect();
        assert_eq!(lines[0].coordinate.s, Some(9000.0));
        assert_eq!(lines[0].comment.as_deref(), Some("; pass"));
        assert!(lines[1..]
            .iter()
            .all(|l| l.coordinate.s.is_none() && l.comment.is_none()));
    }

    #[test]
    fn test_other_lines_pass_through() {
        let out = conform("G21\nM3 S1000\nM30", &flat(1.0));
        let raw: Vec<MotionCommand> = ["G21", "M3 S1000", "M30"]
            .iter()
            .map(|l| MotionCommand::Other(l.to_string()))
            .collect();
        assert_eq!(out.commands(), raw.as_slice());
    }

    #[test]
    fn test_arcs_become_linear_segments() {
        let out = conform("G1 X10 Y0 Z0\nG2 X10 Y0 I-5 J0", &flat(1.0));
        // 11 points for the line, 21 for the full circle
        assert_eq!(out.len(), 11 + 21);
        assert!(out.iter().all(|c| matches!(c, MotionCommand::Linear(_))));
    }

    #[test]
    fn test_position_tracks_original_coordinates() {
        let parser = GcodeParser::new();
        let seq = parser.parse("G1 X10 Z-2\nG1 Y10");
        let out = SurfaceConformer::new(Interpolator::new(1, 1))
            .conform(&seq, &flat(4.0), parser.start_position())
            .unwrap();
        // Second move starts from the un-draped end of the first
        let second_start = out.commands()[2].coordinate().unwrap();
        assert_eq!(second_start.x, Some(10.0));
        assert_eq!(second_start.z, Some(4.0 - 2.0));
    }

    #[test]
    fn test_empty_surface_fails() {
        let parser = GcodeParser::new();
        let seq = parser.parse("G1 X10");
        let err = SurfaceConformer::default()
            .conform(&seq, &SurfaceMesh::new(Vec::new()), parser.start_position())
            .unwrap_err();
        assert_eq!(err, SurfaceError::NoSurfaceData);
    }

    #[test]
    fn test_input_not_mutated() {
        let parser = GcodeParser::new();
        let seq = parser.parse("G0 Z1\nG1 X3");
        let before = seq.clone();
        SurfaceConformer::default()
            .conform(&seq, &flat(1.0), parser.start_position())
            .unwrap();
        assert_eq!(seq, before);
    }
}
