//! Mock implementations for testing
//!
//! Provides a scripted metric source, a recording notifier and a manually
//! advanced clock so monitor behaviour can be tested without real hardware,
//! network or wall-clock waits. Handles are cheap clones sharing the same
//! state, so a test keeps one and hands another to the monitor.

use crate::alerts::{AlertPayload, MetricKey, Notification, Notifier};
use crate::clock::Clock;
use crate::error::{DeliveryError, SourceError};
use crate::source::MetricSource;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Metric source answering from a per-key script
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    values: Arc<Mutex<HashMap<MetricKey, Result<f64, SourceError>>>>,
    reads: Arc<Mutex<Vec<MetricKey>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `value` for `key` until changed
    pub fn set(&self, key: MetricKey, value: f64) {
        self.values.lock().unwrap().insert(key, Ok(value));
    }

    /// Fail reads of `key` with `error` until changed
    pub fn fail(&self, key: MetricKey, error: SourceError) {
        self.values.lock().unwrap().insert(key, Err(error));
    }

    /// Every key read so far, in order
    pub fn reads(&self) -> Vec<MetricKey> {
        self.reads.lock().unwrap().clone()
    }
}

impl MetricSource for MockSource {
    fn read(&mut self, key: &MetricKey) -> Result<f64, SourceError> {
        self.reads.lock().unwrap().push(key.clone());
        self.values
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| {
                Err(SourceError::Backend {
                    key: key.to_string(),
                    message: "no scripted value".to_string(),
                })
            })
    }
}

/// Notifier that records everything it is asked to send
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (nothing is recorded while failing)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successfully delivered notifications
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Successfully delivered alerts
    pub fn alerts(&self) -> Vec<AlertPayload> {
        self.sent()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Alert(payload) => Some(payload),
                Notification::Status(_) => None,
            })
            .collect()
    }
}

impl Notifier for MockNotifier {
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Status {
                status: 503,
                body: "mock failure".to_string(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mock_source_script() {
        let source = MockSource::new();
        let mut handle = source.clone();
        source.set(MetricKey::Cpu, 50.0);

        assert_eq!(handle.read(&MetricKey::Cpu), Ok(50.0));
        assert!(handle.read(&MetricKey::Memory).is_err());
        assert_eq!(source.reads(), vec![MetricKey::Cpu, MetricKey::Memory]);
    }

    #[test]
    fn test_mock_notifier_failure_toggle() {
        let notifier = MockNotifier::new();
        let status = Notification::Status(crate::alerts::StatusReport {
            timestamp: Utc::now(),
            host: crate::host::HostIdentity::local("h"),
            readings: vec![],
        });

        notifier.set_failing(true);
        assert!(notifier.send(&status).is_err());
        notifier.set_failing(false);
        assert!(notifier.send(&status).is_ok());
        assert_eq!(notifier.sent().len(), 1);
        assert!(notifier.alerts().is_empty());
    }

    #[test]
    fn test_manual_clock() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::minutes(90));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(90));
    }
}
