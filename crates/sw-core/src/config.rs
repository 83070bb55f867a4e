use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::allocation::{Bounds, default_axis_keys};
use crate::constants::{
    AXIS_COUNT, FOLLOW_SPEED, MAX_LEVEL, MIN_LEVEL, RECEDE_SPEED, TENSION_SPREAD, THIN_COUPLING,
    VISUAL_MAX,
};
use crate::magnetism::Magnetism;
use crate::redistribution::{BehaviorMode, UpdateOptions};
use crate::threshold::ThresholdGeometry;

/// Smallest follow speed a session accepts; zero would freeze the drag.
const MIN_FOLLOW_SPEED: f64 = 0.01;

/// Widest magnetism capture window: half the distance between integers.
const MAX_MAGNET_THRESHOLD: f64 = 0.5;

/// Everything a session is built from. Supplied once, at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub axes: usize,
    pub min_level: u32,
    pub max_level: u32,
    pub visual_max: f64,
    pub geometry: ThresholdGeometry,
    pub follow_speed: f64,
    pub tension_spread: f64,
    pub thin_coupling: f64,
    pub restore_on_shrink: bool,
    pub recede_speed: f64,
    pub magnetism: Magnetism,
    pub mode: BehaviorMode,
    /// Labels for `to_allocation`, in axis order. Empty means `axis0..axisN`.
    /// A repeated key is replaced by a generated one (see [`EngineConfig::keys`]).
    pub axis_keys: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            axes: AXIS_COUNT,
            min_level: MIN_LEVEL,
            max_level: MAX_LEVEL,
            visual_max: VISUAL_MAX,
            geometry: ThresholdGeometry::default(),
            follow_speed: FOLLOW_SPEED,
            tension_spread: TENSION_SPREAD,
            thin_coupling: THIN_COUPLING,
            restore_on_shrink: false,
            recede_speed: RECEDE_SPEED,
            magnetism: Magnetism::default(),
            mode: BehaviorMode::default(),
            axis_keys: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min_level, self.max_level, self.visual_max)
    }

    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            follow_speed: self.follow_speed,
            tension_spread: self.tension_spread,
            thin_coupling: self.thin_coupling,
            restore_on_shrink: self.restore_on_shrink,
            magnetism: self.magnetism,
        }
    }

    /// Axis keys, one per axis and all distinct. Configured keys win; gaps
    /// and repeats are filled with `axis{i}`, suffixed until unused.
    pub fn keys(&self) -> Vec<String> {
        let axes = self.axes.max(1);
        let mut seen = HashSet::with_capacity(axes);
        let mut keys = Vec::with_capacity(axes);
        for (i, fallback) in default_axis_keys(axes).into_iter().enumerate() {
            let key = match self.axis_keys.get(i) {
                Some(k) if !seen.contains(k.as_str()) => k.clone(),
                _ => {
                    let mut key = fallback;
                    let mut n = 1;
                    while seen.contains(key.as_str()) {
                        key = format!("axis{i}_{n}");
                        n += 1;
                    }
                    key
                }
            };
            seen.insert(key.clone());
            keys.push(key);
        }
        keys
    }

    /// Copy with every parameter clamped into its legal range.
    ///
    /// Non-finite numbers fall back to the defaults.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let bounds = self.bounds();
        Self {
            axes: self.axes.max(1),
            min_level: bounds.min,
            max_level: bounds.max,
            visual_max: bounds.visual_max,
            geometry: self.geometry.clone(),
            follow_speed: finite_or(self.follow_speed, defaults.follow_speed)
                .clamp(MIN_FOLLOW_SPEED, 1.0),
            tension_spread: finite_or(self.tension_spread, defaults.tension_spread).clamp(0.0, 1.0),
            thin_coupling: finite_or(self.thin_coupling, defaults.thin_coupling).clamp(0.0, 1.0),
            restore_on_shrink: self.restore_on_shrink,
            recede_speed: finite_or(self.recede_speed, defaults.recede_speed).max(0.0),
            magnetism: Magnetism {
                strength: finite_or(self.magnetism.strength, defaults.magnetism.strength)
                    .clamp(0.0, 1.0),
                threshold: finite_or(self.magnetism.threshold, defaults.magnetism.threshold)
                    .clamp(0.0, MAX_MAGNET_THRESHOLD),
            },
            mode: self.mode,
            axis_keys: self.keys(),
        }
    }
}

fn finite_or(x: f64, fallback: f64) -> f64 {
    if x.is_finite() { x } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_canonical() {
        let c = EngineConfig::default();
        assert_eq!(c.axes, 7);
        assert_eq!(c.bounds(), Bounds::default());
        assert_eq!(c.keys().len(), 7);
        assert_eq!(c.keys()[6], "axis6");
    }

    #[test]
    fn test_sanitized_clamps() {
        let c = EngineConfig {
            axes: 0,
            follow_speed: 0.0,
            tension_spread: 3.0,
            thin_coupling: f64::NAN,
            recede_speed: -1.0,
            magnetism: Magnetism {
                strength: 2.0,
                threshold: 0.9,
            },
            ..EngineConfig::default()
        }
        .sanitized();
        assert_eq!(c.axes, 1);
        assert_eq!(c.follow_speed, MIN_FOLLOW_SPEED);
        assert_eq!(c.tension_spread, 1.0);
        assert_eq!(c.thin_coupling, THIN_COUPLING);
        assert_eq!(c.recede_speed, 0.0);
        assert_eq!(c.magnetism.strength, 1.0);
        assert_eq!(c.magnetism.threshold, 0.5);
    }

    #[test]
    fn test_keys_padded_and_truncated() {
        let c = EngineConfig {
            axes: 3,
            axis_keys: vec!["str".into()],
            ..EngineConfig::default()
        };
        assert_eq!(c.keys(), vec!["str", "axis1", "axis2"]);

        let c = EngineConfig {
            axes: 1,
            axis_keys: vec!["str".into(), "dex".into()],
            ..EngineConfig::default()
        };
        assert_eq!(c.keys(), vec!["str"]);
    }

    #[test]
    fn test_keys_are_distinct() {
        let c = EngineConfig {
            axes: 4,
            axis_keys: vec!["a".into(), "a".into(), "axis1".into(), "b".into()],
            ..EngineConfig::default()
        };
        assert_eq!(c.keys(), vec!["a", "axis1", "axis2", "b"]);

        let c = EngineConfig {
            axes: 3,
            axis_keys: vec!["axis1".into(), "x".into(), "x".into()],
            ..EngineConfig::default()
        };
        assert_eq!(c.keys(), vec!["axis1", "x", "axis2"]);
    }

    #[test]
    fn test_duplicate_keys_keep_allocation_roundtrip() {
        use crate::allocation::{from_allocation, to_allocation};

        let c = EngineConfig {
            axis_keys: vec!["str".into(); 7],
            ..EngineConfig::default()
        };
        let keys = c.keys();
        let bounds = c.bounds();
        let alloc: crate::Allocation = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), (i % 3) as u32))
            .collect();
        assert_eq!(alloc.len(), 7);
        let v = from_allocation(&alloc, &keys, &bounds);
        assert_eq!(to_allocation(&v, &keys, &bounds), alloc);
    }

    #[test]
    fn test_serde_defaults_fill_gaps() {
        let c: EngineConfig = serde_json::from_str(r#"{"mode":"clay","axes":5}"#).unwrap();
        assert_eq!(c.mode, BehaviorMode::Clay);
        assert_eq!(c.axes, 5);
        assert_eq!(c.follow_speed, FOLLOW_SPEED);
    }
}
