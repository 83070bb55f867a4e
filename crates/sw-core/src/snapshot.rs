//! Immutable session snapshots.
//!
//! A host that renders on one thread and runs the session on another passes
//! snapshots across its channel instead of sharing the session. The JSON form
//! uses camelCase field names and carries a format version.

use serde::{Deserialize, Serialize};

use crate::allocation::Allocation;
use crate::config::EngineConfig;
use crate::redistribution::BehaviorMode;
use crate::session::Session;

pub const SNAPSHOT_VERSION: &str = "1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub version: String,
    pub values: Vec<f64>,
    pub floors: Vec<u32>,
    #[serde(default)]
    pub active_axis: Option<usize>,
    #[serde(default)]
    pub allocation: Allocation,
    #[serde(default)]
    pub mode: BehaviorMode,
}

impl Session {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            values: self.values().to_vec(),
            floors: self.floors(),
            active_axis: self.active_axis(),
            allocation: self.allocation(),
            mode: self.config().mode,
        }
    }

    /// Rebuild a session from a snapshot under `config`, using the
    /// snapshot's behavior mode. Values are clamped into the configured range
    /// and the committed floors are recomputed from them; recorded floors
    /// that disagree are logged and ignored.
    pub fn restore(config: &EngineConfig, snapshot: &SessionSnapshot) -> Self {
        let config = EngineConfig {
            mode: snapshot.mode,
            ..config.clone()
        };
        let mut session = Session::from_values(&config, &snapshot.values);
        session.restore_drag(snapshot.active_axis);
        let floors = session.floors();
        if !snapshot.floors.is_empty() && snapshot.floors != floors {
            tracing::warn!(
                recorded = ?snapshot.floors,
                restored = ?floors,
                "snapshot floors disagree with its values"
            );
        }
        session
    }
}

pub fn export_json(snapshot: &SessionSnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}

pub fn import_json(json: &str) -> serde_json::Result<SessionSnapshot> {
    serde_json::from_str(json)
}
