//! Monitor state persistence
//!
//! Breach timers and alert history survive restarts through a JSON state
//! file written atomically after every check cycle.

pub mod store;

pub use store::{StateLock, StateStore};

use crate::alerts::{AlertRecord, BreachState, MetricKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current persisted schema version
pub const STATE_VERSION: u32 = 1;

/// Everything the monitor remembers between cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    pub version: u32,
    /// Breach state by metric key
    #[serde(default)]
    pub breaches: BTreeMap<MetricKey, BreachState>,
    /// Alert history by metric key
    #[serde(default)]
    pub alerts: BTreeMap<MetricKey, AlertRecord>,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            breaches: BTreeMap::new(),
            alerts: BTreeMap::new(),
        }
    }
}

impl MonitorState {
    /// No breach or alert history at all
    pub fn is_empty(&self) -> bool {
        self.breaches.is_empty() && self.alerts.is_empty()
    }

    /// Keys with an active breach
    pub fn active_breaches(&self) -> impl Iterator<Item = (&MetricKey, &BreachState)> {
        self.breaches.iter().filter(|(_, state)| state.active())
    }
}
