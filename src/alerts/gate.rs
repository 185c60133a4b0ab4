//! Alert deduplication
//!
//! Decides whether a sustained breach may produce another notification,
//! given when the last one for the same key was delivered.

use super::types::{elapsed_between, AlertRecord, MetricKey};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Cooldown policy over per-key alert history
#[derive(Debug, Clone, Default)]
pub struct AlertGate {
    records: BTreeMap<MetricKey, AlertRecord>,
}

impl AlertGate {
    /// Create a gate with no alert history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gate resuming from persisted alert history
    pub fn with_records(records: BTreeMap<MetricKey, AlertRecord>) -> Self {
        Self { records }
    }

    /// All alert records
    pub fn records(&self) -> &BTreeMap<MetricKey, AlertRecord> {
        &self.records
    }

    /// Last successful delivery for a key
    pub fn last_sent(&self, key: &MetricKey) -> Option<DateTime<Utc>> {
        self.records.get(key).and_then(|r| r.last_sent)
    }

    /// Whether a notification for `key` is allowed at `now`
    ///
    /// Allowed when nothing was ever sent, or when strictly more than
    /// `cooldown` has passed since the last delivery.
    pub fn should_notify(&self, key: &MetricKey, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.last_sent(key) {
            None => true,
            Some(last) => elapsed_between(last, now) > cooldown,
        }
    }

    /// Earliest instant after which `key` becomes eligible again
    pub fn eligible_after(&self, key: &MetricKey, cooldown: Duration) -> Option<DateTime<Utc>> {
        let last = self.last_sent(key)?;
        let cooldown = chrono::Duration::from_std(cooldown).ok()?;
        last.checked_add_signed(cooldown)
    }

    /// Record a confirmed delivery
    ///
    /// Only call after the notifier reported success; a failed attempt
    /// must leave the record alone so the next cycle can retry.
    pub fn record_sent(&mut self, key: &MetricKey, now: DateTime<Utc>) {
        self.records.entry(key.clone()).or_default().last_sent = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HOUR: Duration = Duration::from_secs(3600);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_first_alert_is_allowed() {
        let gate = AlertGate::new();
        assert!(gate.should_notify(&MetricKey::Cpu, t0(), 3 * HOUR));
    }

    #[test]
    fn test_cooldown_is_strict() {
        let mut gate = AlertGate::new();
        gate.record_sent(&MetricKey::Cpu, t0());

        let exactly = t0() + chrono::Duration::hours(3);
        assert!(!gate.should_notify(&MetricKey::Cpu, exactly, 3 * HOUR));

        let just_after = exactly + chrono::Duration::seconds(1);
        assert!(gate.should_notify(&MetricKey::Cpu, just_after, 3 * HOUR));
    }

    #[test]
    fn test_suppressed_within_cooldown() {
        let mut gate = AlertGate::new();
        gate.record_sent(&MetricKey::Memory, t0());
        for minutes in [1, 60, 179] {
            let now = t0() + chrono::Duration::minutes(minutes);
            assert!(!gate.should_notify(&MetricKey::Memory, now, 3 * HOUR));
        }
    }

    #[test]
    fn test_keys_do_not_share_cooldown() {
        let mut gate = AlertGate::new();
        gate.record_sent(&MetricKey::disk("/data"), t0());

        let now = t0() + chrono::Duration::minutes(5);
        assert!(!gate.should_notify(&MetricKey::disk("/data"), now, 3 * HOUR));
        assert!(gate.should_notify(&MetricKey::disk("/"), now, 3 * HOUR));
        assert!(gate.should_notify(&MetricKey::Cpu, now, 3 * HOUR));
    }

    #[test]
    fn test_record_overwrites_last_sent() {
        let mut gate = AlertGate::new();
        gate.record_sent(&MetricKey::Cpu, t0());
        let later = t0() + chrono::Duration::hours(4);
        gate.record_sent(&MetricKey::Cpu, later);
        assert_eq!(gate.last_sent(&MetricKey::Cpu), Some(later));
        assert_eq!(
            gate.eligible_after(&MetricKey::Cpu, 3 * HOUR),
            Some(later + chrono::Duration::hours(3))
        );
    }
}
