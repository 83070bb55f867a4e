use std::collections::BTreeMap;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_LEVEL, MAX_LEVEL_SPAN, MIN_LEVEL, VISUAL_MAX};

/// Committed integer allocation keyed by caller-supplied axis keys.
pub type Allocation = BTreeMap<String, u32>;

/// Level bounds shared by every axis.
///
/// `min..=max` is the committed integer range; `visual_max` is the transient
/// ceiling a dragged axis may overshoot to before it settles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
    pub visual_max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: MIN_LEVEL,
            max: MAX_LEVEL,
            visual_max: VISUAL_MAX,
        }
    }
}

impl Bounds {
    /// Build bounds, repairing an inverted range and a ceiling below `max`.
    /// The range is capped at [`MAX_LEVEL_SPAN`] levels above `min`.
    pub fn new(min: u32, max: u32, visual_max: f64) -> Self {
        let max = max
            .max(min.saturating_add(1))
            .min(min.saturating_add(MAX_LEVEL_SPAN));
        let visual_max = if visual_max.is_finite() {
            visual_max.max(max as f64)
        } else {
            max as f64
        };
        Self {
            min,
            max,
            visual_max,
        }
    }

    pub fn lower(&self) -> f64 {
        self.min as f64
    }

    pub fn upper(&self) -> f64 {
        self.max as f64
    }

    /// Clamp into the transient range `[min, visual_max]`.
    pub fn clamp_visual(&self, value: f64) -> f64 {
        finite_or_clamped(value, self.lower(), self.visual_max)
    }

    /// Clamp into the committed range `[min, max]`.
    pub fn clamp_committed(&self, value: f64) -> f64 {
        finite_or_clamped(value, self.lower(), self.upper())
    }

    /// Committed level of a continuous value: `floor(clamp(value, min, max))`.
    pub fn floor_of(&self, value: f64) -> u32 {
        self.clamp_committed(value).floor() as u32
    }

    /// Number of integer levels, `max - min + 1`.
    pub fn level_count(&self) -> usize {
        (self.max - self.min) as usize + 1
    }
}

/// Clamp a value into `[lo, hi]`, mapping non-finite input to the nearest bound.
///
/// A non-finite value here means the caller's configuration is degenerate.
/// Debug builds stop on it; release builds clamp and log.
pub(crate) fn finite_or_clamped(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_finite() {
        return value.clamp(lo, hi);
    }
    debug_assert!(value.is_finite(), "non-finite axis value: {value}");
    tracing::warn!("non-finite axis value {value} clamped into [{lo}, {hi}]");
    if value == f64::INFINITY { hi } else { lo }
}

/// Continuous per-axis values, one slot per axis.
///
/// Every element is finite and inside `[min, visual_max]` of the bounds it was
/// built with. Read access goes through `Deref<Target = [f64]>`; writes go
/// through the engine so the range invariant is re-established on every step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationVector(Vec<f64>);

impl AllocationVector {
    /// Vector of `axes` slots, all at the bottom of the range.
    pub fn at_min(axes: usize, bounds: &Bounds) -> Self {
        Self(vec![bounds.lower(); axes])
    }

    /// Vector from raw values, clamping each into the transient range.
    pub fn from_values(values: Vec<f64>, bounds: &Bounds) -> Self {
        Self(values.into_iter().map(|v| bounds.clamp_visual(v)).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.0
    }

    /// Committed level of every axis.
    pub fn floors(&self, bounds: &Bounds) -> Vec<u32> {
        self.0.iter().map(|&v| bounds.floor_of(v)).collect()
    }
}

impl Deref for AllocationVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Integer allocation of a vector, keyed in axis order by `keys`.
///
/// Axes beyond the end of `keys` are not reported.
pub fn to_allocation(values: &[f64], keys: &[String], bounds: &Bounds) -> Allocation {
    keys.iter()
        .zip(values)
        .map(|(key, &v)| (key.clone(), bounds.floor_of(v)))
        .collect()
}

/// Vector for an external allocation, one axis per key in `keys` order.
/// Missing keys start at the bottom of the range; values are clamped and floored.
pub fn from_allocation(allocation: &Allocation, keys: &[String], bounds: &Bounds) -> AllocationVector {
    let values = keys
        .iter()
        .map(|key| {
            let level = allocation.get(key).copied().unwrap_or(bounds.min);
            level.clamp(bounds.min, bounds.max) as f64
        })
        .collect();
    AllocationVector(values)
}

/// Default axis keys: `axis0`, `axis1`, ...
pub fn default_axis_keys(axes: usize) -> Vec<String> {
    (0..axes).map(|i| format!("axis{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<String> {
        ["str", "dex", "con", "int", "wis", "cha", "luk"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_bounds_repair() {
        let b = Bounds::new(3, 1, 0.5);
        assert_eq!(b.min, 3);
        assert_eq!(b.max, 4);
        assert!((b.visual_max - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_floor_of_clamps() {
        let b = Bounds::default();
        assert_eq!(b.floor_of(-0.5), 0);
        assert_eq!(b.floor_of(0.99), 0);
        assert_eq!(b.floor_of(1.0), 1);
        assert_eq!(b.floor_of(2.55), 2);
    }

    #[test]
    fn test_from_values_clamps_to_visual_range() {
        let b = Bounds::default();
        let v = AllocationVector::from_values(vec![-1.0, 1.5, 9.0], &b);
        assert_eq!(v.as_slice(), &[0.0, 1.5, 2.6]);
    }

    #[test]
    fn test_to_allocation_uses_keys_in_order() {
        let b = Bounds::default();
        let values = [0.2, 1.9, 2.4, 0.0, 1.0, 1.2, 2.0];
        let alloc = to_allocation(&values, &keys(), &b);
        assert_eq!(alloc["str"], 0);
        assert_eq!(alloc["dex"], 1);
        assert_eq!(alloc["con"], 2);
        assert_eq!(alloc["luk"], 2);
        assert_eq!(alloc.len(), 7);
    }

    #[test]
    fn test_from_allocation_missing_key_is_min() {
        let b = Bounds::default();
        let mut alloc = Allocation::new();
        alloc.insert("int".to_string(), 2);
        alloc.insert("cha".to_string(), 7);
        let v = from_allocation(&alloc, &keys(), &b);
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_allocation_roundtrip() {
        let b = Bounds::default();
        let keys = keys();
        let alloc: Allocation = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), (i % 3) as u32))
            .collect();
        let v = from_allocation(&alloc, &keys, &b);
        assert_eq!(to_allocation(&v, &keys, &b), alloc);
    }

    #[test]
    fn test_bounds_span_capped() {
        let b = Bounds::new(0, u32::MAX, 4_000_000_000.5);
        assert_eq!(b.max, MAX_LEVEL_SPAN);
        assert_eq!(b.level_count(), MAX_LEVEL_SPAN as usize + 1);

        let b = Bounds::new(u32::MAX - 1, u32::MAX, f64::NAN);
        assert_eq!(b.max, u32::MAX);
        assert_eq!(b.level_count(), 2);
    }

    #[test]
    fn test_default_axis_keys() {
        assert_eq!(default_axis_keys(2), vec!["axis0", "axis1"]);
    }
}
