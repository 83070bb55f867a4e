//! Caller-owned drag session.
//!
//! The session holds the only mutable state in the engine: the current
//! vector, the active axis, and the last committed floors. Gesture callbacks
//! drive [`Session::begin`], [`Session::update`] and [`Session::end`]; the
//! host's animation scheduler drives [`Session::tick`]. Every call returns the
//! events it produced.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::allocation::{Allocation, AllocationVector, Bounds, from_allocation, to_allocation};
use crate::config::EngineConfig;
use crate::constants::{MAX_TICK_SECS, REFERENCE_FRAME_SECS};
use crate::crossing::{CrossingDetector, LevelCrossed};
use crate::geometry::Point;
use crate::magnetism::snap_all;
use crate::redistribution::{RedistributionStrategy, UpdateOptions, update};
use crate::settle::{is_settled, settle_tick};
use crate::threshold::{Rings, vertex_points};

/// Output of a session call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// One axis moved to a different committed level. The haptic hook.
    LevelCrossed(LevelCrossed),
    /// The committed allocation changed. Emitted once per call, after the
    /// crossings that caused it.
    AllocationChanged { allocation: Allocation },
}

#[derive(Debug)]
pub struct Session {
    config: EngineConfig,
    bounds: Bounds,
    rings: Rings,
    options: UpdateOptions,
    keys: Vec<String>,
    strategy: Box<dyn RedistributionStrategy>,
    values: AllocationVector,
    detector: CrossingDetector,
    active_axis: Option<usize>,
}

impl Session {
    /// Session with every axis at the bottom of the range.
    pub fn new(config: &EngineConfig) -> Self {
        let bounds = config.sanitized().bounds();
        let values = AllocationVector::at_min(config.axes.max(1), &bounds);
        Self::with_values(config, values)
    }

    /// Session starting from an external allocation.
    pub fn from_allocation(config: &EngineConfig, allocation: &Allocation) -> Self {
        let config = config.sanitized();
        let values = from_allocation(allocation, &config.keys(), &config.bounds());
        Self::with_values(&config, values)
    }

    /// Session starting from raw values, clamped into range. Missing axes
    /// start at the bottom; extra values are dropped.
    pub fn from_values(config: &EngineConfig, values: &[f64]) -> Self {
        let config = config.sanitized();
        let bounds = config.bounds();
        let mut raw: Vec<f64> = values.iter().copied().take(config.axes).collect();
        raw.resize(config.axes, bounds.lower());
        Self::with_values(&config, AllocationVector::from_values(raw, &bounds))
    }

    fn with_values(config: &EngineConfig, values: AllocationVector) -> Self {
        let config = config.sanitized();
        let bounds = config.bounds();
        let rings = config.geometry.rings(&bounds);
        let detector = CrossingDetector::new(values.floors(&bounds));
        Self {
            options: config.update_options(),
            keys: config.keys(),
            strategy: config.mode.strategy(),
            bounds,
            rings,
            values,
            detector,
            active_axis: None,
            config,
        }
    }

    /// Replace the redistribution strategy chosen by the configured mode.
    pub fn with_strategy(mut self, strategy: Box<dyn RedistributionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rings(&self) -> &Rings {
        &self.rings
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Current continuous values, for rendering.
    pub fn values(&self) -> &AllocationVector {
        &self.values
    }

    pub fn active_axis(&self) -> Option<usize> {
        self.active_axis
    }

    pub fn is_dragging(&self) -> bool {
        self.active_axis.is_some()
    }

    /// Committed level of every axis.
    pub fn floors(&self) -> Vec<u32> {
        self.values.floors(&self.bounds)
    }

    pub fn allocation(&self) -> Allocation {
        to_allocation(&self.values, &self.keys, &self.bounds)
    }

    /// Shape vertices for the current values.
    pub fn vertices(&self, center: Point) -> Vec<Point> {
        vertex_points(&self.values, center, &self.rings)
    }

    /// True when no drag is active and every axis is at rest.
    pub fn is_settled(&self) -> bool {
        self.active_axis.is_none() && is_settled(&self.values, None, &self.rings)
    }

    /// Start dragging `axis` at radial `distance`. A drag already in progress
    /// is ended first.
    pub fn begin(&mut self, axis: usize, distance: f64) -> Vec<SessionEvent> {
        let mut events = self.end();
        let axis = axis % self.values.len();
        tracing::debug!(axis, distance, "drag begin");
        self.active_axis = Some(axis);
        events.extend(self.drag_to(axis, distance));
        events
    }

    /// Continue the drag. Moving onto another axis commits every axis first;
    /// updating without a drag starts one.
    pub fn update(&mut self, axis: usize, distance: f64) -> Vec<SessionEvent> {
        let axis = axis % self.values.len();
        match self.active_axis {
            None => self.begin(axis, distance),
            Some(active) if active != axis => {
                tracing::debug!(from = active, to = axis, "active axis changed");
                let mut events = self.commit();
                self.active_axis = Some(axis);
                events.extend(self.drag_to(axis, distance));
                events
            }
            Some(_) => self.drag_to(axis, distance),
        }
    }

    /// Finish the drag, committing every axis to its nearest integer.
    /// Does nothing when no drag is active.
    pub fn end(&mut self) -> Vec<SessionEvent> {
        let Some(axis) = self.active_axis.take() else {
            return Vec::new();
        };
        tracing::debug!(axis, "drag end");
        self.commit()
    }

    /// One settle tick at the reference frame rate.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        self.tick_scaled(1.0)
    }

    /// One settle tick covering `elapsed` wall time. The recede step scales
    /// with elapsed time relative to a 60 Hz frame; long gaps are capped.
    pub fn tick_for(&mut self, elapsed: Duration) -> Vec<SessionEvent> {
        let secs = elapsed.as_secs_f64().min(MAX_TICK_SECS);
        self.tick_scaled(secs / REFERENCE_FRAME_SECS)
    }

    /// Tick until at rest or `max_ticks` is reached. Returns the ticks run and
    /// every event produced.
    pub fn settle(&mut self, max_ticks: usize) -> (usize, Vec<SessionEvent>) {
        let mut events = Vec::new();
        let mut ticks = 0;
        while ticks < max_ticks && !is_settled(&self.values, self.active_axis, &self.rings) {
            events.extend(self.tick());
            ticks += 1;
        }
        (ticks, events)
    }

    fn tick_scaled(&mut self, frames: f64) -> Vec<SessionEvent> {
        let step = self.config.recede_speed * frames;
        self.values = settle_tick(&self.values, self.active_axis, &self.rings, step);
        self.observe()
    }

    fn drag_to(&mut self, axis: usize, distance: f64) -> Vec<SessionEvent> {
        let target = self.rings.distance_to_value(distance);
        self.values = update(
            &self.values,
            axis,
            target,
            &self.options,
            &self.bounds,
            self.strategy.as_ref(),
        );
        self.observe()
    }

    fn commit(&mut self) -> Vec<SessionEvent> {
        self.values = snap_all(&self.values, &self.bounds);
        self.observe()
    }

    fn observe(&mut self) -> Vec<SessionEvent> {
        let crossings = self.detector.observe_all(&self.values, &self.bounds);
        if crossings.is_empty() {
            return Vec::new();
        }
        let mut events: Vec<SessionEvent> =
            crossings.into_iter().map(SessionEvent::LevelCrossed).collect();
        events.push(SessionEvent::AllocationChanged {
            allocation: self.allocation(),
        });
        events
    }

    pub(crate) fn restore_drag(&mut self, active_axis: Option<usize>) {
        self.active_axis = active_axis.map(|a| a % self.values.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redistribution::{BehaviorMode, Proportional};

    fn crossings(events: &[SessionEvent]) -> Vec<LevelCrossed> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::LevelCrossed(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    fn allocation_changes(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::AllocationChanged { .. }))
            .count()
    }

    #[test]
    fn test_new_session_at_min() {
        let s = Session::new(&EngineConfig::default());
        assert_eq!(s.values().len(), 7);
        assert!(s.values().iter().all(|&v| v == 0.0));
        assert!(s.is_settled());
        assert!(!s.is_dragging());
    }

    #[test]
    fn test_drag_out_crosses_levels() {
        let mut s = Session::new(&EngineConfig::default());
        let mut events = s.begin(0, 120.0);
        for _ in 0..20 {
            events.extend(s.update(0, 120.0));
        }
        let ups: Vec<_> = crossings(&events).into_iter().filter(|c| c.axis == 0).collect();
        assert_eq!(ups.len(), 2, "expected 0->1 and 1->2, got {ups:?}");
        assert_eq!(s.floors()[0], 2);
        assert!(s.values()[0] > 2.0, "overshoot expected, got {}", s.values()[0]);
        assert_eq!(allocation_changes(&events), 2);
    }

    #[test]
    fn test_end_commits_and_settles() {
        let mut s = Session::new(&EngineConfig::default());
        s.begin(2, 85.0);
        for _ in 0..20 {
            s.update(2, 85.0);
        }
        s.end();
        assert!(!s.is_dragging());
        assert_eq!(s.values()[2], 2.0);
        let (ticks, _) = s.settle(1000);
        assert!(ticks < 1000);
        assert!(s.is_settled());
        assert_eq!(s.allocation()["axis2"], 2);
    }

    #[test]
    fn test_end_without_drag_is_noop() {
        let mut s = Session::new(&EngineConfig::default());
        assert!(s.end().is_empty());
    }

    #[test]
    fn test_begin_cancels_previous_drag() {
        let mut s = Session::new(&EngineConfig::default());
        s.begin(0, 60.0);
        s.update(0, 60.0);
        s.begin(3, 10.0);
        assert_eq!(s.active_axis(), Some(3));
        // The first drag was committed to an integer.
        assert_eq!(s.values()[0], s.values()[0].round());
    }

    #[test]
    fn test_axis_change_commits() {
        let mut s = Session::new(&EngineConfig::default());
        s.begin(1, 85.0);
        for _ in 0..10 {
            s.update(1, 85.0);
        }
        s.update(4, 0.0);
        assert_eq!(s.active_axis(), Some(4));
        assert_eq!(s.values()[1], 2.0);
    }

    #[test]
    fn test_update_without_begin_starts_drag() {
        let mut s = Session::new(&EngineConfig::default());
        s.update(9, 30.0);
        assert_eq!(s.active_axis(), Some(2));
    }

    #[test]
    fn test_tick_leaves_active_axis() {
        let mut s = Session::new(&EngineConfig::default());
        s.begin(0, 40.0);
        let before = s.values()[0];
        s.tick();
        assert_eq!(s.values()[0], before);
    }

    #[test]
    fn test_tick_for_scales_step() {
        let config = EngineConfig::default();
        let mut a = Session::from_values(&config, &[1.9]);
        let mut b = Session::from_values(&config, &[1.9]);
        a.tick_for(Duration::from_secs_f64(REFERENCE_FRAME_SECS * 2.0));
        b.tick();
        b.tick();
        assert!((a.values()[0] - b.values()[0]).abs() < 1e-6);
    }

    #[test]
    fn test_from_allocation() {
        let config = EngineConfig {
            axis_keys: ["str", "dex", "con", "int", "wis", "cha", "luk"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..EngineConfig::default()
        };
        let mut alloc = Allocation::new();
        alloc.insert("int".into(), 2);
        alloc.insert("dex".into(), 1);
        let s = Session::from_allocation(&config, &alloc);
        assert_eq!(s.floors(), vec![0, 1, 0, 2, 0, 0, 0]);
        let out = s.allocation();
        assert_eq!(out["int"], 2);
        assert_eq!(out["dex"], 1);
        assert_eq!(out["str"], 0);
    }

    #[test]
    fn test_clay_mode_and_custom_strategy() {
        let config = EngineConfig {
            mode: BehaviorMode::Clay,
            ..EngineConfig::default()
        };
        let s = Session::new(&config);
        assert_eq!(s.strategy_name(), "proportional");
        let s = Session::new(&EngineConfig::default()).with_strategy(Box::new(Proportional));
        assert_eq!(s.strategy_name(), "proportional");
    }

    #[test]
    fn test_huge_level_range_is_capped() {
        let config = EngineConfig {
            max_level: u32::MAX,
            visual_max: 4_000_000_000.5,
            ..EngineConfig::default()
        };
        let mut s = Session::new(&config);
        assert_eq!(s.bounds().max, crate::constants::MAX_LEVEL_SPAN);
        assert_eq!(s.rings().radii().len(), crate::constants::MAX_LEVEL_SPAN as usize + 1);
        s.begin(0, 120.0);
        s.end();
        assert!(s.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Session>();
    }
}
