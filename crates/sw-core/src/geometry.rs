//! Polar layout of the wheel.
//!
//! Axis 0 points straight up from the center (screen coordinates, y down),
//! i.e. at angle -π/2, and axes proceed clockwise in sectors of 2π/N.

use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

/// A point in layout coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A point resolved onto the wheel: nearest axis, clamped radial distance,
/// and the raw `atan2` angle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polar {
    pub axis: usize,
    pub distance: f64,
    pub angle: f64,
}

/// Angular width of one axis sector.
pub fn sector_width(axes: usize) -> f64 {
    TAU / axes.max(1) as f64
}

/// Screen angle at which axis `axis` is drawn.
pub fn angle_for_axis(axis: usize, axes: usize) -> f64 {
    let axes = axes.max(1);
    (axis % axes) as f64 * sector_width(axes) - FRAC_PI_2
}

/// Axis whose sector center is nearest to `angle`.
pub fn axis_from_angle(angle: f64, axes: usize) -> usize {
    let axes = axes.max(1);
    if !angle.is_finite() {
        return 0;
    }
    let turned = (angle + FRAC_PI_2).rem_euclid(TAU);
    let index = (turned / sector_width(axes)).round() as usize;
    index % axes
}

/// Resolve a point relative to the wheel center.
pub fn to_polar(point: Point, center: Point, axes: usize, max_radius: f64) -> Polar {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    let angle = dy.atan2(dx);
    let distance = dx.hypot(dy);
    let distance = if distance.is_finite() {
        distance.clamp(0.0, max_radius.max(0.0))
    } else {
        0.0
    };
    Polar {
        axis: axis_from_angle(angle, axes),
        distance,
        angle,
    }
}

/// Point at `distance` along axis `axis`.
pub fn from_polar(axis: usize, distance: f64, center: Point, axes: usize) -> Point {
    let angle = angle_for_axis(axis, axes);
    Point {
        x: center.x + distance * angle.cos(),
        y: center.y + distance * angle.sin(),
    }
}

/// Shortest hop count between two axes on the N-cycle.
pub fn circular_distance(a: usize, b: usize, axes: usize) -> usize {
    let axes = axes.max(1);
    let diff = (a % axes).abs_diff(b % axes);
    diff.min(axes - diff)
}

/// Polygon vertices for per-axis radial distances, in axis order.
pub fn polygon(distances: &[f64], center: Point) -> Vec<Point> {
    let axes = distances.len();
    distances
        .iter()
        .enumerate()
        .map(|(i, &d)| from_polar(i, d, center, axes))
        .collect()
}
