use serde::{Deserialize, Serialize};

use crate::allocation::Bounds;

/// An axis's committed level changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCrossed {
    pub axis: usize,
    pub from: u32,
    pub to: u32,
}

impl LevelCrossed {
    pub fn is_rising(&self) -> bool {
        self.to > self.from
    }
}

/// Remembers the last committed level per axis and reports changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingDetector {
    last_floors: Vec<u32>,
}

impl CrossingDetector {
    pub fn new(initial_floors: Vec<u32>) -> Self {
        Self {
            last_floors: initial_floors,
        }
    }

    pub fn last_floors(&self) -> &[u32] {
        &self.last_floors
    }

    /// Observe axis `axis` at `value`. Returns the crossing, if any.
    /// Axes outside the tracked range are ignored.
    pub fn observe(&mut self, axis: usize, value: f64, bounds: &Bounds) -> Option<LevelCrossed> {
        let slot = self.last_floors.get_mut(axis)?;
        let floor = bounds.floor_of(value);
        if floor == *slot {
            return None;
        }
        let crossed = LevelCrossed {
            axis,
            from: *slot,
            to: floor,
        };
        *slot = floor;
        Some(crossed)
    }

    /// Observe every axis, in axis order.
    pub fn observe_all(&mut self, values: &[f64], bounds: &Bounds) -> Vec<LevelCrossed> {
        values
            .iter()
            .enumerate()
            .filter_map(|(axis, &v)| self.observe(axis, v, bounds))
            .collect()
    }
}
