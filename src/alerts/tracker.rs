//! Sustained-threshold tracking
//!
//! Records, per metric key, when the current continuous breach began and
//! decides when it has lasted long enough to alert on.

use super::types::{elapsed_between, BreachState, BreachTransition, MetricKey};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-metric breach state machine
#[derive(Debug, Clone)]
pub struct ThresholdTracker {
    /// Time a breach must last before it counts as sustained
    sustained: Duration,
    /// Breach state by metric key
    states: BTreeMap<MetricKey, BreachState>,
}

impl ThresholdTracker {
    /// Create a tracker with no breach history
    pub fn new(sustained: Duration) -> Self {
        Self::with_states(sustained, BTreeMap::new())
    }

    /// Create a tracker resuming from persisted breach state
    pub fn with_states(sustained: Duration, states: BTreeMap<MetricKey, BreachState>) -> Self {
        Self { sustained, states }
    }

    /// Required sustained duration
    pub fn sustained(&self) -> Duration {
        self.sustained
    }

    /// Current breach state for a key (inactive if never seen)
    pub fn state(&self, key: &MetricKey) -> BreachState {
        self.states.get(key).copied().unwrap_or_default()
    }

    /// All tracked states
    pub fn states(&self) -> &BTreeMap<MetricKey, BreachState> {
        &self.states
    }

    /// Feed one sample and report the resulting transition
    ///
    /// A value equal to the threshold counts as breaching. Any sample below
    /// the threshold ends the breach and the next breach starts a fresh
    /// timer.
    pub fn update(
        &mut self,
        key: &MetricKey,
        value: f64,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> BreachTransition {
        let previous = self.state(key);

        if value >= threshold {
            match previous.since() {
                None => {
                    self.states.insert(key.clone(), BreachState::started(now));
                    BreachTransition::BreachStarted
                }
                Some(since) => {
                    let elapsed = elapsed_between(since, now);
                    if elapsed >= self.sustained {
                        BreachTransition::SustainedBreach { since, elapsed }
                    } else {
                        BreachTransition::BreachPending { elapsed }
                    }
                }
            }
        } else {
            self.states.insert(key.clone(), BreachState::default());
            match previous.since() {
                Some(since) => BreachTransition::BreachEnded {
                    lasted: elapsed_between(since, now),
                },
                None => BreachTransition::Normal,
            }
        }
    }
}
