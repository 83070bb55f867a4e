//! Idle relaxation: every axis that is not being dragged drifts toward the
//! resting value of its committed level, a fixed step per tick.

use crate::allocation::AllocationVector;
use crate::constants::SETTLE_EPSILON;
use crate::threshold::Rings;

/// Move `value` toward `resting` by at most `step`, never past it.
pub fn recede_step(value: f64, resting: f64, step: f64) -> f64 {
    let gap = resting - value;
    if gap.abs() <= SETTLE_EPSILON {
        return resting;
    }
    let step = step.max(0.0);
    if gap.abs() <= step {
        resting
    } else {
        value + step * gap.signum()
    }
}

/// One settle tick over every axis except `active`.
///
/// Pure: returns a new vector. `step` is the recede distance for this tick.
pub fn settle_tick(
    state: &AllocationVector,
    active: Option<usize>,
    rings: &Rings,
    step: f64,
) -> AllocationVector {
    let bounds = *rings.bounds();
    let mut next = state.clone();
    for (i, v) in next.values_mut().iter_mut().enumerate() {
        if Some(i) == active {
            continue;
        }
        let resting = rings.resting_value_for_floor(bounds.floor_of(*v));
        *v = bounds.clamp_visual(recede_step(*v, resting, step));
    }
    next
}

/// True when every axis except `active` sits on its resting value.
pub fn is_settled(state: &[f64], active: Option<usize>, rings: &Rings) -> bool {
    let bounds = rings.bounds();
    state.iter().enumerate().all(|(i, &v)| {
        Some(i) == active
            || (v - rings.resting_value_for_floor(bounds.floor_of(v))).abs() <= SETTLE_EPSILON
    })
}

/// Upper bound on the ticks needed to settle `state` at a fixed `step`.
pub fn ticks_to_settle(state: &[f64], active: Option<usize>, rings: &Rings, step: f64) -> usize {
    if step <= 0.0 {
        return if is_settled(state, active, rings) { 0 } else { usize::MAX };
    }
    let bounds = rings.bounds();
    state
        .iter()
        .enumerate()
        .filter(|&(i, _)| Some(i) != active)
        .map(|(_, &v)| {
            let gap = (v - rings.resting_value_for_floor(bounds.floor_of(v))).abs();
            if gap <= SETTLE_EPSILON { 0 } else { (gap / step).ceil() as usize }
        })
        .max()
        .unwrap_or(0)
}
