//! Planar geometry for toolpath generation
//!
//! All coordinates are machine millimetres in the XY plane. Z is carried
//! separately as a layer height, never as part of a point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in the XY plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
}

impl Point2 {
    /// Create a point from its coordinates
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(
            x.is_finite() && y.is_finite(),
            "Point2 coordinates must be finite: x={x}, y={y}"
        );
        Self { x, y }
    }

    /// Point at `angle` radians and `radius` from `center`
    pub fn on_circle(center: Point2, radius: f64, angle: f64) -> Self {
        Self::new(
            angle.cos() * radius + center.x,
            angle.sin() * radius + center.y,
        )
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}
