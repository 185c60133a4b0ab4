//! Check-cycle monitor
//!
//! Samples every configured metric, feeds the threshold tracker, alerts on
//! sustained breaches through the cooldown gate and persists state after
//! each cycle. Collaborator failures are contained here: a failed read skips
//! that metric, a failed delivery leaves the alert history alone and a failed
//! save is logged.

use crate::alerts::{
    format_duration, AlertGate, AlertPayload, BreachTransition, MetricKey, Notification,
    Notifier, Reading, StatusReport, ThresholdTracker,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{DeliveryError, SourceError};
use crate::host::HostIdentity;
use crate::services::Shutdown;
use crate::source::MetricSource;
use crate::state::{MonitorState, StateStore, STATE_VERSION};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// One metric the monitor checks each cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTarget {
    pub key: MetricKey,
    /// Threshold in percent
    pub threshold: f64,
}

/// Thresholds and timing for the monitor
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdConfig {
    /// How long a breach must last before alerting
    pub sustained: Duration,
    /// Minimum time between alerts for the same key
    pub cooldown: Duration,
    /// Pause between cycles in continuous mode
    pub check_interval: Duration,
    /// Metrics in check order: cpu, memory, then each partition
    pub metrics: Vec<MetricTarget>,
}

impl ThresholdConfig {
    /// Derive the check plan from configuration
    ///
    /// Duplicate partitions are checked once.
    pub fn from_config(config: &Config) -> Self {
        let mut metrics = vec![
            MetricTarget {
                key: MetricKey::Cpu,
                threshold: config.thresholds.cpu,
            },
            MetricTarget {
                key: MetricKey::Memory,
                threshold: config.thresholds.memory,
            },
        ];

        for partition in &config.monitor.disk_partitions {
            let key = MetricKey::disk(partition.as_str());
            if metrics.iter().any(|m| m.key == key) {
                log::warn!("Partition {} listed more than once", partition);
                continue;
            }
            metrics.push(MetricTarget {
                key,
                threshold: config.thresholds.disk,
            });
        }

        Self {
            sustained: config.monitor.sustained(),
            cooldown: config.monitor.cooldown(),
            check_interval: config.monitor.check_interval(),
            metrics,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What happened to the alert for one metric in a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertOutcome {
    /// No sustained breach, nothing to send
    NotRequired,
    /// Delivered and recorded
    Sent,
    /// Held back by the cooldown
    Suppressed {
        eligible_after: Option<DateTime<Utc>>,
    },
    /// Delivery failed; retried next cycle
    Failed { error: String },
}

/// Result of checking one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOutcome {
    pub metric: MetricKey,
    pub threshold: f64,
    /// `None` when the read failed
    pub value: Option<f64>,
    /// `None` when the read failed and the breach state was left untouched
    pub transition: Option<BreachTransition>,
    pub alert: AlertOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one check cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub host: String,
    pub outcomes: Vec<MetricOutcome>,
    /// Whether the state file was written
    pub persisted: bool,
}

impl CycleReport {
    /// Outcome for a specific metric
    pub fn outcome(&self, key: &MetricKey) -> Option<&MetricOutcome> {
        self.outcomes.iter().find(|o| &o.metric == key)
    }

    /// Number of alerts delivered this cycle
    pub fn alerts_sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.alert == AlertOutcome::Sent)
            .count()
    }

    /// Number of metrics that could not be read
    pub fn read_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.value.is_none()).count()
    }
}

/// Resource monitor
pub struct Monitor<S, N, C = SystemClock> {
    thresholds: ThresholdConfig,
    source: S,
    notifier: N,
    clock: C,
    host: HostIdentity,
    tracker: ThresholdTracker,
    gate: AlertGate,
    store: StateStore,
}

impl<S: MetricSource, N: Notifier> Monitor<S, N, SystemClock> {
    /// Create a monitor, resuming from whatever state `store` holds
    pub fn new(
        thresholds: ThresholdConfig,
        source: S,
        notifier: N,
        host: HostIdentity,
        store: StateStore,
    ) -> Self {
        let state = store.load();
        Self::with_state(thresholds, source, notifier, host, store, state)
    }

    /// Create a monitor starting from `state` without reading `store`
    pub fn with_state(
        thresholds: ThresholdConfig,
        source: S,
        notifier: N,
        host: HostIdentity,
        store: StateStore,
        state: MonitorState,
    ) -> Self {
        Self {
            tracker: ThresholdTracker::with_states(thresholds.sustained, state.breaches),
            gate: AlertGate::with_records(state.alerts),
            thresholds,
            source,
            notifier,
            clock: SystemClock,
            host,
            store,
        }
    }
}

impl<S: MetricSource, N: Notifier, C: Clock> Monitor<S, N, C> {
    /// Replace the clock
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Monitor<S, N, C2> {
        Monitor {
            thresholds: self.thresholds,
            source: self.source,
            notifier: self.notifier,
            clock,
            host: self.host,
            tracker: self.tracker,
            gate: self.gate,
            store: self.store,
        }
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn host(&self) -> &HostIdentity {
        &self.host
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Current in-memory state
    pub fn snapshot(&self) -> MonitorState {
        MonitorState {
            version: STATE_VERSION,
            breaches: self.tracker.states().clone(),
            alerts: self.gate.records().clone(),
        }
    }

    /// Run one check cycle over every configured metric
    pub fn run_cycle(&mut self) -> CycleReport {
        // One timestamp for the whole cycle keeps metrics comparable
        let now = self.clock.now();
        let targets = self.thresholds.metrics.clone();
        let mut outcomes = Vec::with_capacity(targets.len());

        for MetricTarget { key, threshold } in targets {
            let value = match self.sample(&key) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Skipping {} this cycle: {}", key, e);
                    outcomes.push(MetricOutcome {
                        metric: key,
                        threshold,
                        value: None,
                        transition: None,
                        alert: AlertOutcome::NotRequired,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let transition = self.tracker.update(&key, value, threshold, now);
            log::debug!("{}: {:.1}% (threshold {}%) -> {}", key, value, threshold, transition);

            match transition {
                BreachTransition::BreachStarted => log::info!(
                    "{} usage high: {:.1}% (threshold {}%), starting timer",
                    key,
                    value,
                    threshold
                ),
                BreachTransition::BreachEnded { lasted } => log::info!(
                    "{} usage back to normal: {:.1}% after {}",
                    key,
                    value,
                    format_duration(lasted)
                ),
                _ => {}
            }

            let alert = if transition.is_alert_candidate() {
                self.alert(&key, value, threshold, now)
            } else {
                AlertOutcome::NotRequired
            };

            outcomes.push(MetricOutcome {
                metric: key,
                threshold,
                value: Some(value),
                transition: Some(transition),
                alert,
                error: None,
            });
        }

        let persisted = match self.store.save(&self.snapshot()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to persist monitor state: {}", e);
                false
            }
        };

        CycleReport {
            timestamp: now,
            host: self.host.display(),
            outcomes,
            persisted,
        }
    }

    /// Run cycles until `shutdown` fires, calling `on_cycle` after each
    ///
    /// Returns the number of completed cycles.
    pub fn run<F: FnMut(&CycleReport)>(&mut self, shutdown: &Shutdown, mut on_cycle: F) -> u64 {
        log::info!(
            "Monitoring {} metrics on {} every {}s",
            self.thresholds.metrics.len(),
            self.host.display(),
            self.thresholds.check_interval.as_secs()
        );

        let mut cycles = 0;
        while !shutdown.is_triggered() {
            let report = self.run_cycle();
            cycles += 1;
            on_cycle(&report);

            if shutdown.wait_timeout(self.thresholds.check_interval) {
                break;
            }
        }

        log::info!("Monitor stopped after {} cycles", cycles);
        cycles
    }

    /// Sample every metric without touching breach or alert state
    pub fn readings(&mut self) -> Vec<Reading> {
        let keys: Vec<MetricKey> = self.thresholds.metrics.iter().map(|m| m.key.clone()).collect();
        keys.into_iter()
            .map(|key| {
                let value = match self.sample(&key) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        log::warn!("Failed to read {}: {}", key, e);
                        None
                    }
                };
                Reading { metric: key, value }
            })
            .collect()
    }

    /// Current readings with host identity
    pub fn status_report(&mut self) -> StatusReport {
        let readings = self.readings();
        StatusReport {
            timestamp: self.clock.now(),
            host: self.host.clone(),
            readings,
        }
    }

    /// Send a status report through the notifier
    pub fn send_status(&mut self) -> Result<StatusReport, DeliveryError> {
        let report = self.status_report();
        self.notifier.send(&Notification::Status(report.clone()))?;
        log::info!("Sent status report via {}", self.notifier.name());
        Ok(report)
    }

    fn sample(&mut self, key: &MetricKey) -> Result<f64, SourceError> {
        let value = self.source.read(key)?;
        if !value.is_finite() {
            return Err(SourceError::Backend {
                key: key.to_string(),
                message: format!("non-finite sample {}", value),
            });
        }
        Ok(value)
    }

    fn alert(
        &mut self,
        key: &MetricKey,
        value: f64,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> AlertOutcome {
        let cooldown = self.thresholds.cooldown;
        if !self.gate.should_notify(key, now, cooldown) {
            let eligible_after = self.gate.eligible_after(key, cooldown);
            log::debug!("{} alert suppressed by cooldown", key);
            return AlertOutcome::Suppressed { eligible_after };
        }

        let payload = AlertPayload::new(key, value, threshold, &self.host, now);
        match self.notifier.send(&Notification::Alert(payload)) {
            Ok(()) => {
                self.gate.record_sent(key, now);
                log::info!("Sent {} alert via {}", key, self.notifier.name());
                AlertOutcome::Sent
            }
            Err(e) => {
                log::warn!(
                    "Failed to deliver {} alert via {}: {}",
                    key,
                    self.notifier.name(),
                    e
                );
                AlertOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
