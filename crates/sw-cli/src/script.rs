//! Gesture scripts: a JSON array of steps replayed against a session.
//!
//! ```json
//! [{"begin": {"axis": 3, "distance": 85.0}},
//!  {"update": {"axis": 3, "distance": 90.0}},
//!  "end",
//!  {"tick": 10},
//!  {"settle": null}]
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sw_core::{Allocation, Session, SessionEvent};

/// Tick cap for a `settle` step without an explicit limit.
pub const DEFAULT_SETTLE_TICKS: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Begin { axis: usize, distance: f64 },
    Update { axis: usize, distance: f64 },
    End,
    Tick(usize),
    Settle(Option<usize>),
}

pub fn parse_script(json: &str) -> Result<Vec<Step>> {
    serde_json::from_str(json).context("script must be a JSON array of steps")
}

/// Run every step, returning the events in order.
pub fn run(session: &mut Session, steps: &[Step]) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    for step in steps {
        match *step {
            Step::Begin { axis, distance } => events.extend(session.begin(axis, distance)),
            Step::Update { axis, distance } => events.extend(session.update(axis, distance)),
            Step::End => events.extend(session.end()),
            Step::Tick(n) => {
                for _ in 0..n {
                    events.extend(session.tick());
                }
            }
            Step::Settle(limit) => {
                let (ticks, settled) = session.settle(limit.unwrap_or(DEFAULT_SETTLE_TICKS));
                tracing::debug!(ticks, "settle step");
                events.extend(settled);
            }
        }
    }
    events
}

/// Parse `key=value,key=value` into an allocation.
pub fn parse_start(pairs: &str) -> Result<Allocation> {
    let mut allocation = Allocation::new();
    for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected key=value, got '{pair}'");
        };
        let level: u32 = value
            .trim()
            .parse()
            .with_context(|| format!("level for '{}' is not a whole number", key.trim()))?;
        allocation.insert(key.trim().to_string(), level);
    }
    Ok(allocation)
}
