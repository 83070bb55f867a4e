use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationVector, Bounds};
use crate::constants::{MAGNET_STRENGTH, MAGNET_THRESHOLD, SNAP_COMPLETE, SNAP_EXACT};

/// Pull applied toward the nearest integer while a value is inside the window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Magnetism {
    pub strength: f64,
    pub threshold: f64,
}

impl Default for Magnetism {
    fn default() -> Self {
        Self {
            strength: MAGNET_STRENGTH,
            threshold: MAGNET_THRESHOLD,
        }
    }
}

impl Magnetism {
    pub fn apply(&self, value: f64) -> (f64, bool) {
        apply_integer_magnetism(value, self.strength, self.threshold)
    }
}

/// Pull `value` toward its nearest integer.
///
/// Returns the new value and whether it landed on the integer. Values already
/// within `SNAP_EXACT` snap outright; values inside `threshold` move by a
/// fraction that grows as they approach; everything else is left alone.
pub fn apply_integer_magnetism(value: f64, strength: f64, threshold: f64) -> (f64, bool) {
    if !value.is_finite() {
        return (value, false);
    }
    let nearest = value.round();
    let dist = (value - nearest).abs();
    if dist < SNAP_EXACT {
        return (nearest, true);
    }
    if dist < threshold {
        let pull = strength.clamp(0.0, 1.0) * (threshold - dist) / threshold;
        let pulled = value + pull * (nearest - value);
        if (pulled - nearest).abs() < SNAP_COMPLETE {
            return (nearest, true);
        }
        return (pulled, false);
    }
    (value, false)
}

/// Hard commit of one value: nearest integer inside the committed range.
pub fn snap_to_integer(value: f64, bounds: &Bounds) -> f64 {
    bounds.clamp_committed(value.round())
}

/// Hard commit of every axis.
pub fn snap_all(values: &AllocationVector, bounds: &Bounds) -> AllocationVector {
    let mut out = values.clone();
    for v in out.values_mut() {
        *v = snap_to_integer(*v, bounds);
    }
    out
}
