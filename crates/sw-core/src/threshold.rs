//! Distance-to-value mapping over per-level threshold rings.
//!
//! Each integer level owns a ring radius. Between two consecutive rings the
//! mapping is linear, so the ring for level k maps to exactly k no matter how
//! unevenly the rings are spaced. Past the top ring, the remaining radius maps
//! linearly onto the overshoot band `[max, visual_max]`.

use serde::{Deserialize, Serialize};

use crate::allocation::Bounds;
use crate::constants::{EPSILON, MAX_RADIUS, MIN_RADIUS, REST_MARGIN, REST_PAD};
use crate::geometry::{Point, polygon};

/// Visual radius override for one level's ring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelScale {
    pub level: u32,
    pub scale: f64,
}

/// Ring layout parameters, shared by every axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdGeometry {
    pub min_radius: f64,
    pub max_radius: f64,
    /// Per-level multipliers on the evenly spaced ring radius.
    pub level_scale: Vec<LevelScale>,
    /// Pad beyond each level's ring where idle axes come to rest.
    pub rest_pad: Vec<f64>,
}

impl Default for ThresholdGeometry {
    fn default() -> Self {
        Self {
            min_radius: MIN_RADIUS,
            max_radius: MAX_RADIUS,
            level_scale: Vec::new(),
            rest_pad: REST_PAD.to_vec(),
        }
    }
}

impl ThresholdGeometry {
    fn scale_for(&self, level: u32) -> f64 {
        self.level_scale
            .iter()
            .rev()
            .find(|s| s.level == level)
            .map(|s| s.scale)
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0)
    }

    fn pad_for(&self, level: u32) -> f64 {
        let pad = self
            .rest_pad
            .get(level as usize)
            .or(self.rest_pad.last())
            .copied()
            .unwrap_or(0.0);
        if pad.is_finite() { pad.max(0.0) } else { 0.0 }
    }

    /// Resolve ring radii for `bounds`.
    pub fn rings(&self, bounds: &Bounds) -> Rings {
        let bounds = &Bounds::new(bounds.min, bounds.max, bounds.visual_max);
        let min_radius = if self.min_radius.is_finite() {
            self.min_radius.max(0.0)
        } else {
            0.0
        };
        let max_radius = if self.max_radius.is_finite() {
            self.max_radius.max(min_radius)
        } else {
            min_radius
        };
        let span = max_radius - min_radius;
        let levels_span = bounds.visual_max - bounds.lower();

        let mut radii = Vec::with_capacity(bounds.level_count());
        let mut prev = min_radius;
        for level in bounds.min..=bounds.max {
            let fraction = if levels_span > EPSILON {
                (level - bounds.min) as f64 / levels_span
            } else {
                0.0
            };
            let r = (min_radius + span * fraction * self.scale_for(level))
                .clamp(min_radius, max_radius)
                .max(prev);
            radii.push(r);
            prev = r;
        }

        let pads = (bounds.min..=bounds.max)
            .map(|level| self.pad_for(level))
            .collect();

        Rings {
            radii,
            pads,
            max_radius,
            bounds: *bounds,
        }
    }
}

/// Resolved ring radii for one set of bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Rings {
    radii: Vec<f64>,
    pads: Vec<f64>,
    max_radius: f64,
    bounds: Bounds,
}

impl Rings {
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Ring radius of `level`, clamped into the level range.
    pub fn radius_for_level(&self, level: u32) -> f64 {
        let level = level.clamp(self.bounds.min, self.bounds.max);
        self.radii[(level - self.bounds.min) as usize]
    }

    /// Continuous value at radial distance `distance`.
    pub fn distance_to_value(&self, distance: f64) -> f64 {
        let d = if distance.is_finite() {
            distance.clamp(0.0, self.max_radius)
        } else {
            0.0
        };
        let lower = self.bounds.lower();
        if d <= self.radii[0] {
            return lower;
        }
        for (j, pair) in self.radii.windows(2).enumerate() {
            let (inner, outer) = (pair[0], pair[1]);
            if d <= outer {
                return lower + j as f64 + safe_ratio(d - inner, outer - inner);
            }
        }
        let top = self.radii[self.radii.len() - 1];
        let overshoot = self.bounds.visual_max - self.bounds.upper();
        let value = self.bounds.upper() + safe_ratio(d - top, self.max_radius - top) * overshoot;
        value.min(self.bounds.visual_max)
    }

    /// Radial distance at which `value` is drawn. Inverse of [`distance_to_value`].
    ///
    /// [`distance_to_value`]: Rings::distance_to_value
    pub fn value_to_distance(&self, value: f64) -> f64 {
        let v = self.bounds.clamp_visual(value);
        let offset = v - self.bounds.lower();
        let last = self.radii.len() - 1;
        let top = self.radii[last];
        if offset < last as f64 {
            let j = offset.floor() as usize;
            let frac = offset - j as f64;
            let (inner, outer) = (self.radii[j], self.radii[j + 1]);
            return inner + frac * (outer - inner);
        }
        let overshoot = self.bounds.visual_max - self.bounds.upper();
        top + safe_ratio(v - self.bounds.upper(), overshoot) * (self.max_radius - top)
    }

    /// Value an idle axis with committed level `floor` relaxes toward.
    ///
    /// Lands a small pad past the floor's ring, stays strictly inside the
    /// floor's band, and never exceeds MAX.
    pub fn resting_value_for_floor(&self, floor: u32) -> f64 {
        let floor = floor.clamp(self.bounds.min, self.bounds.max);
        if floor == self.bounds.min {
            return self.bounds.lower();
        }
        if floor == self.bounds.max {
            return self.bounds.upper();
        }
        let pad = self.pads[(floor - self.bounds.min) as usize];
        let value = self.distance_to_value(self.radius_for_level(floor) + pad);
        let level = floor as f64;
        value.clamp(level, level + 1.0 - REST_MARGIN)
    }

    /// Polygon vertices for a vector of values.
    pub fn vertices(&self, values: &[f64], center: Point) -> Vec<Point> {
        let distances: Vec<f64> = values.iter().map(|&v| self.value_to_distance(v)).collect();
        polygon(&distances, center)
    }

    /// All ring radii, innermost first.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }
}

/// Polygon vertices for `values` drawn on `rings` around `center`.
pub fn vertex_points(values: &[f64], center: Point, rings: &Rings) -> Vec<Point> {
    rings.vertices(values, center)
}

fn safe_ratio(num: f64, den: f64) -> f64 {
    if den.abs() <= EPSILON {
        0.0
    } else {
        (num / den).clamp(0.0, 1.0)
    }
}
