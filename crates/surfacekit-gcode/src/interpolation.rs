//! Path interpolation
//!
//! Breaks linear moves and arcs into evenly spaced points so that each point
//! can be adjusted independently, and builds a display polyline for a whole
//! program.

use serde::{Deserialize, Serialize};
use surfacekit_core::{ArcDirection, ArcSweep, Point3D};

use crate::command::{CommandSequence, Coordinate, MotionCommand};
use crate::parser::MachinePosition;

pub const DEFAULT_INTERPOLATION_STEPS: usize = 10;
pub const DEFAULT_ARC_STEPS: usize = 20;
pub const DEFAULT_VISUAL_ARC_STEPS: usize = 20;

/// Interpolation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpolator {
    /// Segments per linear move
    pub interpolation_steps: usize,
    /// Segments per arc when rewriting
    pub arc_steps: usize,
    /// Segments per arc in the display polyline
    pub visual_arc_steps: usize,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self {
            interpolation_steps: DEFAULT_INTERPOLATION_STEPS,
            arc_steps: DEFAULT_ARC_STEPS,
            visual_arc_steps: DEFAULT_VISUAL_ARC_STEPS,
        }
    }
}

impl Interpolator {
    pub fn new(interpolation_steps: usize, arc_steps: usize) -> Self {
        Self {
            interpolation_steps,
            arc_steps,
            ..Self::default()
        }
    }

    /// Points along `command` starting from `start`, the start point
    /// included.
    ///
    /// Rapids yield only their end point and non-motion lines yield nothing.
    pub fn expand(&self, start: Point3D, command: &MotionCommand) -> Vec<Coordinate> {
        match command {
            MotionCommand::Rapid(line) => {
                vec![point_coordinate(line.coordinate.resolve(start), line.coordinate.f)]
            }
            MotionCommand::Linear(line) => {
                interpolate_linear(start, &line.coordinate, self.interpolation_steps)
            }
            MotionCommand::ArcCw(line) | MotionCommand::ArcCcw(line) => {
                let direction = command
                    .arc_direction()
                    .unwrap_or(ArcDirection::Clockwise);
                self.expand_arc(start, &line.coordinate, direction, self.arc_steps)
            }
            MotionCommand::Other(_) => Vec::new(),
        }
    }

    fn expand_arc(
        &self,
        start: Point3D,
        end: &Coordinate,
        direction: ArcDirection,
        steps: usize,
    ) -> Vec<Coordinate> {
        let points = if end.i.is_none() && end.j.is_none() {
            None
        } else {
            arc_points(
                start,
                end.resolve(start),
                end.i.unwrap_or(0.0),
                end.j.unwrap_or(0.0),
                direction,
                steps,
            )
        };

        match points {
            Some(points) => points
                .into_iter()
                .map(|p| point_coordinate(p, end.f))
                .collect(),
            None => {
                tracing::debug!("Degenerate arc, treating as a direct move");
                interpolate_linear(start, end, self.interpolation_steps)
            }
        }
    }

    /// Whole-program polyline for display.
    ///
    /// Contains one point per rapid or linear end point and
    /// `visual_arc_steps` points per arc. The start position is included only
    /// when the program opens with an arc.
    pub fn visual_polyline(
        &self,
        sequence: &CommandSequence,
        start: MachinePosition,
    ) -> Vec<Point3D> {
        let mut polyline = Vec::new();
        let mut position = start;

        for command in sequence {
            let Some(coordinate) = command.coordinate() else {
                continue;
            };
            let from = position.point();
            let to = coordinate.resolve(from);

            match command.arc_direction() {
                Some(direction) if coordinate.i.is_some() || coordinate.j.is_some() => {
                    match arc_points(
                        from,
                        to,
                        coordinate.i.unwrap_or(0.0),
                        coordinate.j.unwrap_or(0.0),
                        direction,
                        self.visual_arc_steps,
                    ) {
                        Some(points) => {
                            if polyline.is_empty() {
                                polyline.push(from);
                            }
                            polyline.extend(points.into_iter().skip(1));
                        }
                        None => polyline.push(to),
                    }
                }
                _ => polyline.push(to),
            }

            position = position.advance(command);
        }

        polyline
    }
}

/// `steps + 1` evenly spaced points from `start` to `end`.
///
/// Absent end axes keep the start value. The end feed rate is carried to
/// every point. `steps` below one is treated as one.
pub fn interpolate_linear(start: Point3D, end: &Coordinate, steps: usize) -> Vec<Coordinate> {
    let steps = steps.max(1);
    let target = end.resolve(start);

    (0..=steps)
        .map(|k| {
            let t = k as f64 / steps as f64;
            point_coordinate(start.lerp(target, t), end.f)
        })
        .collect()
}

/// `steps + 1` points along an arc from `start` to `end` around
/// `start + (i, j)`, Z interpolated linearly.
///
/// Returns `None` for a zero radius.
pub fn arc_points(
    start: Point3D,
    end: Point3D,
    i: f64,
    j: f64,
    direction: ArcDirection,
    steps: usize,
) -> Option<Vec<Point3D>> {
    let sweep = ArcSweep::from_center_offset(start, end, i, j, direction)?;
    let steps = steps.max(1);

    Some(
        (0..=steps)
            .map(|k| {
                let t = k as f64 / steps as f64;
                let (x, y) = sweep.point_at(t);
                Point3D::new(x, y, start.z + (end.z - start.z) * t)
            })
            .collect(),
    )
}

fn point_coordinate(point: Point3D, feed: Option<f64>) -> Coordinate {
    Coordinate {
        x: Some(point.x),
        y: Some(point.y),
        z: Some(point.z),
        f: feed,
        ..Coordinate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MotionLine;

    const ORIGIN: Point3D = Point3D::new(0.0, 0.0, 0.0);

    #[test]
    fn test_linear_point_count_and_midpoint() {
        let end = Coordinate::xyz(10.0, 0.0, 5.0);
        let points = interpolate_linear(ORIGIN, &end, 10);
        assert_eq!(points.len(), 11);
        assert_eq!(points[5], Coordinate::xyz(5.0, 0.0, 2.5));
        assert_eq!(points[10], Coordinate::xyz(10.0, 0.0, 5.0));
    }

    #[test]
    fn test_linear_carries_feed_and_inherits_axes() {
        let end = Coordinate::new().with_x(4.0).with_feed(300.0);
        let start = Point3D::new(0.0, 2.0, -1.0);
        let points = interpolate_linear(start, &end, 2);
        for p in &points {
            assert_eq!(p.f, Some(300.0));
            assert_eq!(p.y, Some(2.0));
            assert_eq!(p.z, Some(-1.0));
        }
        assert_eq!(points[1].x, Some(2.0));
    }

    #[test]
    fn test_linear_zero_steps_clamped() {
        let points = interpolate_linear(ORIGIN, &Coordinate::xyz(1.0, 1.0, 1.0), 0);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_full_circle_arc() {
        let points = arc_points(ORIGIN, ORIGIN, 10.0, 0.0, ArcDirection::Clockwise, 20).unwrap();
        assert_eq!(points.len(), 21);
        for p in &points {
            let r = (p.x - 10.0).hypot(p.y);
            assert!((r - 10.0).abs() < 1e-6);
        }
        assert!(points[20].x.abs() < 1e-9 && points[20].y.abs() < 1e-9);
    }

    #[test]
    fn test_quarter_arc_directions() {
        let start = Point3D::new(10.0, 0.0, 0.0);
        let end = Point3D::new(0.0, 10.0, -2.0);

        let ccw = arc_points(start, end, -10.0, 0.0, ArcDirection::CounterClockwise, 4).unwrap();
        let cw = arc_points(start, end, -10.0, 0.0, ArcDirection::Clockwise, 4).unwrap();

        // CCW from angle 0 to 90 wraps backwards through the lower half-plane
        assert!(ccw[2].y < 0.0);
        assert!(cw[2].y > 0.0);
        assert!((ccw[4].x - end.x).abs() < 1e-9 && (ccw[4].y - end.y).abs() < 1e-9);
        assert!((cw[2].z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_radius_arc_is_none() {
        assert!(arc_points(ORIGIN, ORIGIN, 0.0, 0.0, ArcDirection::Clockwise, 4).is_none());
    }

    #[test]
    fn test_degenerate_arc_expands_linearly() {
        let interp = Interpolator::new(4, 20);
        let cmd = MotionCommand::ArcCw(MotionLine::new(Coordinate::xyz(8.0, 0.0, 0.0)));
        let points = interp.expand(ORIGIN, &cmd);
        assert_eq!(points.len(), 5);
        assert_eq!(points[2].x, Some(4.0));
    }

    #[test]
    fn test_single_offset_counts_other_as_zero() {
        let interp = Interpolator::new(4, 8);
        let cmd = MotionCommand::ArcCcw(MotionLine::new(
            Coordinate::new().with_x(0.0).with_y(0.0).with_feed(50.0),
        ));
        let mut cmd_with_i = cmd.clone();
        cmd_with_i.motion_mut().unwrap().coordinate.i = Some(5.0);

        let points = interp.expand(ORIGIN, &cmd_with_i);
        assert_eq!(points.len(), 9);
        assert!(points.iter().all(|p| p.f == Some(50.0)));
    }

    #[test]
    fn test_visual_polyline() {
        let interp = Interpolator {
            visual_arc_steps: 4,
            ..Interpolator::default()
        };
        let seq: CommandSequence = vec![
            MotionCommand::rapid(Coordinate::xyz(0.0, 0.0, 1.0)),
            MotionCommand::Other("M3".to_string()),
            MotionCommand::linear(Coordinate::new().with_x(10.0)),
            MotionCommand::ArcCw(MotionLine::new(
                Coordinate::new()
                    .with_x(10.0)
                    .with_y(0.0)
                    .with_center_offset(-5.0, 0.0),
            )),
        ]
        .into();

        let polyline = interp.visual_polyline(&seq, MachinePosition::default());
        assert_eq!(polyline.len(), 2 + 4);
        assert_eq!(polyline[1], Point3D::new(10.0, 0.0, 1.0));
    }
}
