//! Radial stat-allocation engine.
//!
//! Turns a continuous drag signal on a radial wheel into a bounded allocation
//! across N competing axes. Dragging an axis outward raises its value; the
//! other axes pay for the growth (thinning), angular neighbors follow a little
//! (surface tension), and values near an integer are pulled onto it
//! (magnetism). When the finger lifts, every axis commits to an integer and
//! idle axes relax toward a resting value just past their level's ring.
//!
//! Zero I/O: the caller owns the [`Session`] and decides when to call it.

pub mod allocation;
pub mod config;
pub mod constants;
pub mod crossing;
pub mod geometry;
pub mod magnetism;
pub mod redistribution;
pub mod session;
pub mod settle;
pub mod snapshot;
pub mod threshold;

pub use allocation::{
    Allocation, AllocationVector, Bounds, default_axis_keys, from_allocation, to_allocation,
};
pub use config::EngineConfig;
pub use constants::{AXIS_COUNT, EPSILON, MAX_LEVEL, MAX_LEVEL_SPAN, MIN_LEVEL, VISUAL_MAX};
pub use crossing::{CrossingDetector, LevelCrossed};
pub use geometry::{
    Point, Polar, angle_for_axis, axis_from_angle, circular_distance, from_polar, to_polar,
};
pub use magnetism::{Magnetism, apply_integer_magnetism, snap_all, snap_to_integer};
pub use redistribution::{
    BehaviorMode, LowestFirst, Proportional, RedistributeContext, RedistributionStrategy,
    UpdateOptions, update,
};
pub use session::{Session, SessionEvent};
pub use settle::{is_settled, recede_step, settle_tick, ticks_to_settle};
pub use snapshot::{SNAPSHOT_VERSION, SessionSnapshot, export_json, import_json};
pub use threshold::{LevelScale, Rings, ThresholdGeometry, vertex_points};
