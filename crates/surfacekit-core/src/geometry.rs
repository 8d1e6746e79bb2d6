//! Geometry primitives
//!
//! Points, planar extents, the nine bounding-box anchors used for centering,
//! and arc parameterization for G2/G3 moves.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Angles closer than this are treated as the same angle
const ANGLE_EPSILON: f64 = 1e-9;

/// Radii at or below this cannot form an arc
const MIN_ARC_RADIUS: f64 = 1e-9;

/// A point in machine space (millimetres)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1)
    pub fn lerp(self, other: Point3D, t: f64) -> Point3D {
        self + (other - self) * t
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;

    fn mul(self, rhs: f64) -> Point3D {
        Point3D::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Closed interval covered by a set of values on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    /// Extent of the given values, or `None` when there are none
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Extent { min: v, max: v }),
            Some(e) => Some(Extent {
                min: e.min.min(v),
                max: e.max.max(v),
            }),
        })
    }

    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    /// Value at `fraction` of the way from `min` to `max`
    pub fn at(&self, fraction: f64) -> f64 {
        self.min + self.length() * fraction
    }
}

/// Axis-aligned planar bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox2D {
    pub x: Extent,
    pub y: Extent,
}

impl BoundingBox2D {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3D>) -> Option<Self> {
        let points: Vec<&Point3D> = points.into_iter().collect();
        Some(Self {
            x: Extent::from_values(points.iter().map(|p| p.x))?,
            y: Extent::from_values(points.iter().map(|p| p.y))?,
        })
    }
}

/// One of the nine reference points of a bounding box.
///
/// "Top" is the maximum Y edge, matching machine coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Position of the anchor as fractions of the box width and height
    pub fn fractions(self) -> (f64, f64) {
        match self {
            Anchor::TopLeft => (0.0, 1.0),
            Anchor::TopCenter => (0.5, 1.0),
            Anchor::TopRight => (1.0, 1.0),
            Anchor::CenterLeft => (0.0, 0.5),
            Anchor::Center => (0.5, 0.5),
            Anchor::CenterRight => (1.0, 0.5),
            Anchor::BottomLeft => (0.0, 0.0),
            Anchor::BottomCenter => (0.5, 0.0),
            Anchor::BottomRight => (1.0, 0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top_left",
            Anchor::TopCenter => "top_center",
            Anchor::TopRight => "top_right",
            Anchor::CenterLeft => "center_left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center_right",
            Anchor::BottomLeft => "bottom_left",
            Anchor::BottomCenter => "bottom_center",
            Anchor::BottomRight => "bottom_right",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Anchor::ALL
            .into_iter()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| format!("Unknown anchor: {}", s))
    }
}

/// Rotational direction of an arc move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcDirection {
    /// G2
    Clockwise,
    /// G3
    CounterClockwise,
}

/// Angular parameterization of a planar arc.
///
/// The sweep runs monotonically from `start_angle` to `end_angle`: never
/// decreasing for clockwise arcs and never increasing for counter-clockwise
/// arcs. Coincident start and end angles describe a full circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSweep {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl ArcSweep {
    /// Build the sweep for an arc starting at `start`, ending at `end`, with
    /// its center at `start + (i, j)`.
    ///
    /// Returns `None` when the offsets give a zero radius.
    pub fn from_center_offset(
        start: Point3D,
        end: Point3D,
        i: f64,
        j: f64,
        direction: ArcDirection,
    ) -> Option<Self> {
        let radius = i.hypot(j);
        if radius <= MIN_ARC_RADIUS || !radius.is_finite() {
            return None;
        }

        let center_x = start.x + i;
        let center_y = start.y + j;
        let start_angle = (start.y - center_y).atan2(start.x - center_x);
        let mut end_angle = (end.y - center_y).atan2(end.x - center_x);

        let full_circle = (end_angle - start_angle).abs() < ANGLE_EPSILON;
        match direction {
            ArcDirection::Clockwise => {
                if full_circle {
                    end_angle = start_angle + TAU;
                } else if end_angle < start_angle {
                    end_angle += TAU;
                }
            }
            ArcDirection::CounterClockwise => {
                if full_circle {
                    end_angle = start_angle - TAU;
                } else if end_angle > start_angle {
                    end_angle -= TAU;
                }
            }
        }

        Some(Self {
            center_x,
            center_y,
            radius,
            start_angle,
            end_angle,
        })
    }

    /// Signed angular sweep in radians
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Planar point at parameter `t` in `[0, 1]`
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let angle = self.start_angle + self.sweep() * t;
        (
            self.center_x + self.radius * angle.cos(),
            self.center_y + self.radius * angle.sin(),
        )
    }
}
