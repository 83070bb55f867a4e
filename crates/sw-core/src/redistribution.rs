//! Drag update: active-axis follow, surface tension, thinning, magnetism.
//!
//! Growth of the dragged axis is paid for by the other axes. How the bill is
//! split is a [`RedistributionStrategy`]; two ship with the crate:
//! [`LowestFirst`] (production threshold picker) and [`Proportional`]
//! (clay variant).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationVector, Bounds};
use crate::constants::{
    EPSILON, FOLLOW_SPEED, TENSION_FALLOFF, TENSION_REACH, TENSION_SPREAD, THIN_COUPLING,
    THIN_RESISTANCE,
};
use crate::geometry::circular_distance;
use crate::magnetism::Magnetism;

/// Which redistribution heuristic a session uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorMode {
    /// Lowest-valued axes pay first.
    #[default]
    Threshold,
    /// Every axis pays in proportion to how much it can give.
    Clay,
}

impl BehaviorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Clay => "clay",
        }
    }

    pub fn strategy(&self) -> Box<dyn RedistributionStrategy> {
        match self {
            Self::Threshold => Box::new(LowestFirst),
            Self::Clay => Box::new(Proportional),
        }
    }
}

impl fmt::Display for BehaviorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning for one drag update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOptions {
    /// Fraction of the gap to the target closed per update, in (0, 1].
    pub follow_speed: f64,
    /// How much angular neighbors follow the active axis, in [0, 1].
    pub tension_spread: f64,
    /// Fraction of active growth taken from the other axes, in [0, 1].
    pub thin_coupling: f64,
    /// Give budget back to the other axes when the active axis shrinks.
    pub restore_on_shrink: bool,
    pub magnetism: Magnetism,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            follow_speed: FOLLOW_SPEED,
            tension_spread: TENSION_SPREAD,
            thin_coupling: THIN_COUPLING,
            restore_on_shrink: false,
            magnetism: Magnetism::default(),
        }
    }
}

/// Everything a strategy needs besides the values themselves.
#[derive(Clone, Copy, Debug)]
pub struct RedistributeContext<'a> {
    pub bounds: &'a Bounds,
    pub thin_coupling: f64,
    pub restore_on_shrink: bool,
}

/// Splits the cost of active-axis growth across the other axes.
///
/// Implementations must never touch `values[active]`, never push an axis
/// below `bounds.min` when thinning, and never raise an axis above
/// `bounds.max` when restoring.
pub trait RedistributionStrategy: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Remove up to `budget` in total from the non-active axes.
    fn thin(&self, values: &mut [f64], active: usize, budget: f64, bounds: &Bounds);

    /// Return up to `budget` in total to the non-active axes, weighted by headroom.
    fn restore(&self, values: &mut [f64], active: usize, budget: f64, bounds: &Bounds) {
        let headroom: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| if i == active { 0.0 } else { (bounds.upper() - v).max(0.0) })
            .collect();
        let total: f64 = headroom.iter().sum();
        if total <= EPSILON || budget <= EPSILON {
            return;
        }
        for (v, room) in values.iter_mut().zip(&headroom) {
            *v += (budget * room / total).min(*room);
        }
    }

    /// Apply the active axis's change `delta` to the other axes.
    fn redistribute(&self, values: &mut [f64], active: usize, delta: f64, ctx: &RedistributeContext) {
        if delta > EPSILON {
            self.thin(values, active, delta * ctx.thin_coupling, ctx.bounds);
        } else if delta < -EPSILON && ctx.restore_on_shrink {
            self.restore(values, active, -delta * ctx.thin_coupling, ctx.bounds);
        }
    }
}

/// How much an axis at `value` can give. Higher axes resist more.
pub fn removable(value: f64, bounds: &Bounds) -> f64 {
    let above_min = (value - bounds.lower()).max(0.0);
    let upper = bounds.upper();
    let resistance = if upper > EPSILON {
        (1.0 - THIN_RESISTANCE * value / upper).max(0.0)
    } else {
        1.0
    };
    above_min * resistance
}

/// Lowest axes pay first, each up to its removable amount.
///
/// Ties go to the axis farther clockwise from the active axis, so a symmetric
/// pair across the wheel always thins its trailing member.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowestFirst;

impl RedistributionStrategy for LowestFirst {
    fn name(&self) -> &'static str {
        "lowest-first"
    }

    fn thin(&self, values: &mut [f64], active: usize, budget: f64, bounds: &Bounds) {
        let n = values.len();
        let mut order: Vec<usize> = (0..n).filter(|&i| i != active).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    let offset = |i: usize| (i + n - active) % n;
                    offset(b).cmp(&offset(a))
                })
        });

        let mut remaining = budget.max(0.0);
        for i in order {
            if remaining <= EPSILON {
                break;
            }
            let take = removable(values[i], bounds).min(remaining);
            values[i] -= take;
            remaining -= take;
        }
    }
}

/// Every axis pays a share proportional to its removable amount.
#[derive(Clone, Copy, Debug, Default)]
pub struct Proportional;

impl RedistributionStrategy for Proportional {
    fn name(&self) -> &'static str {
        "proportional"
    }

    fn thin(&self, values: &mut [f64], active: usize, budget: f64, bounds: &Bounds) {
        let weights: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| if i == active { 0.0 } else { removable(v, bounds) })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= EPSILON || budget <= EPSILON {
            return;
        }
        for (v, w) in values.iter_mut().zip(&weights) {
            *v -= (budget * w / total).min(*w);
        }
    }
}

/// One drag update toward `target` on axis `active`.
///
/// Pure: the input vector is left untouched and a new vector is returned.
/// `active` wraps modulo the axis count.
pub fn update(
    state: &AllocationVector,
    active: usize,
    target: f64,
    opts: &UpdateOptions,
    bounds: &Bounds,
    strategy: &dyn RedistributionStrategy,
) -> AllocationVector {
    let mut next = state.clone();
    let n = next.len();
    if n == 0 {
        return next;
    }
    let active = active % n;
    let values = next.values_mut();

    let follow = clamp_unit(opts.follow_speed);
    let target = bounds.clamp_visual(target);
    let before = values[active];
    values[active] = bounds.clamp_visual(before + (target - before) * follow);
    let delta = values[active] - before;

    if delta.abs() > EPSILON {
        let spread = clamp_unit(opts.tension_spread);
        for (i, v) in values.iter_mut().enumerate() {
            if i == active {
                continue;
            }
            let dist = circular_distance(i, active, n);
            if dist <= TENSION_REACH {
                let weight = 1.0 - dist as f64 / TENSION_FALLOFF;
                *v = bounds.clamp_visual(*v + delta * spread * weight);
            }
        }
    }

    let ctx = RedistributeContext {
        bounds,
        thin_coupling: clamp_unit(opts.thin_coupling),
        restore_on_shrink: opts.restore_on_shrink,
    };
    let pinned = values[active];
    strategy.redistribute(values, active, delta, &ctx);
    values[active] = pinned;

    for v in values.iter_mut() {
        let (pulled, _) = opts.magnetism.apply(*v);
        *v = bounds.clamp_visual(pulled);
    }

    tracing::trace!(active, delta, strategy = strategy.name(), "drag update");
    next
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones() -> AllocationVector {
        AllocationVector::from_values(vec![1.0; 7], &Bounds::default())
    }

    fn opts() -> UpdateOptions {
        UpdateOptions {
            follow_speed: 0.5,
            tension_spread: 0.15,
            thin_coupling: 0.4,
            ..UpdateOptions::default()
        }
    }

    #[test]
    fn test_drag_scenario_lowest_first() {
        let b = Bounds::default();
        let state = ones();
        let next = update(&state, 0, 2.5, &opts(), &b, &LowestFirst);

        assert!(next[0] > 1.0 && next[0] < 2.5, "active = {}", next[0]);
        assert!(next[1] > 1.0, "neighbor 1 = {}", next[1]);
        assert!(next[6] > 1.0, "neighbor 6 = {}", next[6]);
        assert!((next[3] - 1.0).abs() < 1e-9, "farthest = {}", next[3]);
        let others: f64 = next[1..].iter().sum();
        assert!(others < 6.0, "others sum = {others}");
    }

    #[test]
    fn test_active_value_independent_of_strategy() {
        let b = Bounds::default();
        let state = ones();
        let a = update(&state, 0, 2.5, &opts(), &b, &LowestFirst);
        let c = update(&state, 0, 2.5, &opts(), &b, &Proportional);
        assert_eq!(a[0], c[0]);
        assert!((a[0] - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_input_not_mutated() {
        let b = Bounds::default();
        let state = ones();
        let snapshot = state.clone();
        let _ = update(&state, 2, 2.6, &opts(), &b, &LowestFirst);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_shrink_never_thins() {
        let b = Bounds::default();
        let state = AllocationVector::from_values(vec![2.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5], &b);
        let opts = UpdateOptions {
            tension_spread: 0.0,
            magnetism: Magnetism { strength: 0.0, threshold: 0.0 },
            ..opts()
        };
        let next = update(&state, 0, 0.0, &opts, &b, &LowestFirst);
        assert!(next[0] < 2.0);
        for i in 1..7 {
            assert_eq!(next[i], 0.5);
        }
    }

    #[test]
    fn test_restore_on_shrink_gives_back() {
        let b = Bounds::default();
        let state = AllocationVector::from_values(vec![2.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5], &b);
        let opts = UpdateOptions {
            tension_spread: 0.0,
            restore_on_shrink: true,
            magnetism: Magnetism { strength: 0.0, threshold: 0.0 },
            ..opts()
        };
        let next = update(&state, 0, 0.0, &opts, &b, &Proportional);
        let others: f64 = next[1..].iter().sum();
        // Active drops by 1.0; 0.4 of it returns, spread evenly.
        assert!((others - 3.4).abs() < 1e-9, "others = {others}");
        for i in 1..7 {
            assert!(next[i] <= b.upper());
        }
    }

    #[test]
    fn test_lowest_first_order() {
        let b = Bounds::default();
        let mut values = vec![2.0, 0.2, 1.0, 1.5, 0.4, 1.8, 1.1];
        LowestFirst.thin(&mut values, 0, 0.3, &b);
        // Axis 1 (0.2) can give 0.2 * (1 - 0.03) = 0.194, then axis 4 gives the rest.
        assert!((values[1] - 0.006).abs() < 1e-9);
        assert!((values[4] - (0.4 - 0.106)).abs() < 1e-9);
        assert_eq!(values[0], 2.0);
        assert_eq!(values[2], 1.0);
    }

    #[test]
    fn test_thinning_floor_and_dropped_budget() {
        let b = Bounds::default();
        let mut values = vec![1.0, 0.0, 0.05, 0.0, 0.0, 0.0, 0.0];
        LowestFirst.thin(&mut values, 0, 5.0, &b);
        assert!(values.iter().all(|&v| v >= 0.0));
        assert!(values[2] < 1e-3);
    }

    #[test]
    fn test_proportional_shares() {
        let b = Bounds::default();
        let mut values = vec![2.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0];
        Proportional.thin(&mut values, 0, 0.5, &b);
        for i in [1, 2, 4, 5, 6] {
            assert!((values[i] - 0.9).abs() < 1e-9, "axis {i} = {}", values[i]);
        }
        assert_eq!(values[3], 0.0);
        assert_eq!(values[0], 2.0);
    }

    #[test]
    fn test_thinning_never_raises_others() {
        let b = Bounds::default();
        let before = vec![0.3, 2.4, 1.7, 0.0, 1.2, 0.9, 2.0];
        for strategy in [BehaviorMode::Threshold.strategy(), BehaviorMode::Clay.strategy()] {
            let mut values = before.clone();
            strategy.thin(&mut values, 2, 0.8, &b);
            for i in 0..7 {
                assert!(values[i] <= before[i]);
                assert!(values[i] >= 0.0);
            }
            assert_eq!(values[2], before[2]);
        }
    }

    #[test]
    fn test_active_index_wraps() {
        let b = Bounds::default();
        let state = ones();
        let wrapped = update(&state, 8, 2.5, &opts(), &b, &LowestFirst);
        let direct = update(&state, 1, 2.5, &opts(), &b, &LowestFirst);
        assert_eq!(wrapped, direct);
    }

    #[test]
    fn test_removable_resistance() {
        let b = Bounds::default();
        assert_eq!(removable(0.0, &b), 0.0);
        assert!((removable(1.0, &b) - 0.85).abs() < 1e-12);
        assert!((removable(2.0, &b) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_mode_strings() {
        assert_eq!(BehaviorMode::Clay.to_string(), "clay");
        assert_eq!(BehaviorMode::Threshold.strategy().name(), "lowest-first");
    }
}
