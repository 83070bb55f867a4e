/// Canonical number of competing axes on the wheel.
pub const AXIS_COUNT: usize = 7;

/// Lowest committed level of any axis.
pub const MIN_LEVEL: u32 = 0;

/// Highest committed level of any axis.
pub const MAX_LEVEL: u32 = 2;

/// Widest committed range, `max - min`. Ring radii are resolved per level.
pub const MAX_LEVEL_SPAN: u32 = 64;

/// Transient ceiling allowed while dragging (overshoot feedback).
pub const VISUAL_MAX: f64 = 2.6;

/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-9;

/// Settle tolerance: an axis within this distance of its resting value is at rest.
pub const SETTLE_EPSILON: f64 = 1e-4;

/// Fraction of the gap to the drag target closed per update.
pub const FOLLOW_SPEED: f64 = 0.5;

/// How strongly angular neighbors follow the active axis.
pub const TENSION_SPREAD: f64 = 0.15;

/// Fraction of active-axis growth taken from the other axes.
pub const THIN_COUPLING: f64 = 0.4;

/// Circular distance beyond which surface tension has no effect.
pub const TENSION_REACH: usize = 2;

/// Falloff denominator for surface tension: weight = 1 - dist / TENSION_FALLOFF.
pub const TENSION_FALLOFF: f64 = 3.0;

/// Share of removable value that a full-level axis keeps as resistance.
pub const THIN_RESISTANCE: f64 = 0.3;

/// Value units an idle axis moves toward rest per reference frame.
pub const RECEDE_SPEED: f64 = 0.04;

/// Reference frame duration used to scale elapsed-time ticks (60 Hz).
pub const REFERENCE_FRAME_SECS: f64 = 1.0 / 60.0;

/// Longest elapsed time a single scaled tick will integrate.
pub const MAX_TICK_SECS: f64 = 0.1;

/// Per-tick magnetism pull strength.
pub const MAGNET_STRENGTH: f64 = 0.3;

/// Capture window around each integer for per-tick magnetism.
pub const MAGNET_THRESHOLD: f64 = 0.15;

/// Distance under which a value is already treated as its integer.
pub const SNAP_EXACT: f64 = 0.01;

/// Distance under which a pulled value completes its snap.
pub const SNAP_COMPLETE: f64 = 0.02;

/// Radius of the innermost ring, in layout units.
pub const MIN_RADIUS: f64 = 0.0;

/// Outer radius of the wheel, in layout units.
pub const MAX_RADIUS: f64 = 130.0;

/// Layout-unit pad beyond a level's ring where an idle axis comes to rest,
/// indexed by level. Levels past the end reuse the last entry; the top level
/// always rests on MAX.
pub const REST_PAD: [f64; 2] = [0.0, 6.0];

/// Margin kept between a resting value and the next level boundary.
pub const REST_MARGIN: f64 = 0.02;
