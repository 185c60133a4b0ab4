//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Alert thresholds in percent
    pub thresholds: ThresholdsConfig,
    /// Monitoring cadence and scope
    pub monitor: MonitorSettings,
    /// Webhook delivery
    pub notifier: NotifierConfig,
    /// Host identity lookup
    pub host: HostConfig,
    /// State persistence
    pub state: StateConfig,
}

/// Threshold percentages per metric category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub cpu: f64,
    pub memory: f64,
    /// Applies to every monitored partition
    pub disk: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cpu: 90.0,
            memory: 90.0,
            disk: 90.0,
        }
    }
}

/// Monitoring cadence and scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Minutes a metric must stay above threshold before alerting
    pub sustained_minutes: u64,
    /// Seconds between check cycles in continuous mode
    pub check_interval_secs: u64,
    /// Minutes before the same metric may alert again
    pub cooldown_minutes: u64,
    /// Upper bound on a single metric read
    pub source_timeout_secs: u64,
    /// CPU sampling window in milliseconds
    pub cpu_sample_millis: u64,
    /// Disk partitions to monitor, matched verbatim
    pub disk_partitions: Vec<String>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sustained_minutes: 15,
            check_interval_secs: 60,
            cooldown_minutes: 180,
            source_timeout_secs: 10,
            cpu_sample_millis: 1000,
            disk_partitions: vec!["/".to_string()],
        }
    }
}

impl MonitorSettings {
    pub fn sustained(&self) -> Duration {
        Duration::from_secs(self.sustained_minutes.saturating_mul(60))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_minutes.saturating_mul(60))
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn cpu_sample(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_millis)
    }
}

/// Webhook delivery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Target URL; alerts are skipped while empty
    pub webhook_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sender name shown by chat webhooks
    pub username: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: 10,
            username: "System Monitor".to_string(),
        }
    }
}

/// Host identity configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Query the EC2 instance metadata service
    pub cloud_metadata: bool,
    /// Timeout for each metadata request in seconds
    pub metadata_timeout_secs: u64,
    /// Name to show in alerts instead of the derived one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cloud_metadata: true,
            metadata_timeout_secs: 2,
            display_name: None,
        }
    }
}

/// State persistence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StateConfig {
    /// State file location (defaults to the user data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Resolved state file path
    pub fn state_path(&self) -> PathBuf {
        self.state
            .path
            .clone()
            .unwrap_or_else(crate::state::StateStore::default_path)
    }

    /// Check values the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("thresholds.cpu", self.thresholds.cpu),
            ("thresholds.memory", self.thresholds.memory),
            ("thresholds.disk", self.thresholds.disk),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::invalid(
                    key,
                    format!("{} is not a percentage (0-100)", value),
                ));
            }
        }

        for (key, value) in [
            ("monitor.check_interval_secs", self.monitor.check_interval_secs),
            ("monitor.source_timeout_secs", self.monitor.source_timeout_secs),
            ("notifier.timeout_secs", self.notifier.timeout_secs),
            ("host.metadata_timeout_secs", self.host.metadata_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(key, "must be greater than zero"));
            }
        }

        for (key, minutes) in [
            ("monitor.sustained_minutes", self.monitor.sustained_minutes),
            ("monitor.cooldown_minutes", self.monitor.cooldown_minutes),
        ] {
            if minutes.checked_mul(60).is_none() {
                return Err(ConfigError::invalid(
                    key,
                    format!("{} minutes is out of range", minutes),
                ));
            }
        }

        if self.monitor.cpu_sample() >= self.monitor.source_timeout() {
            return Err(ConfigError::invalid(
                "monitor.cpu_sample_millis",
                "CPU sampling window must be shorter than source_timeout_secs",
            ));
        }

        if self.monitor.disk_partitions.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::invalid(
                "monitor.disk_partitions",
                "partition paths must not be empty",
            ));
        }

        let url = self.notifier.webhook_url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "notifier.webhook_url",
                format!("'{}' is not an http(s) URL", url),
            ));
        }

        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.thresholds.cpu, 90.0);
        assert_eq!(config.monitor.sustained(), Duration::from_secs(15 * 60));
        assert_eq!(config.monitor.cooldown(), Duration::from_secs(3 * 3600));
        assert_eq!(config.monitor.check_interval(), Duration::from_secs(60));
        assert_eq!(config.monitor.disk_partitions, vec!["/".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [thresholds]
            disk = 80

            [monitor]
            disk_partitions = ["/", "/data"]
            "#,
        )
        .unwrap();

        assert_eq!(config.thresholds.disk, 80.0);
        assert_eq!(config.thresholds.cpu, 90.0);
        assert_eq!(config.monitor.disk_partitions.len(), 2);
        assert_eq!(config.monitor.sustained_minutes, 15);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.thresholds.memory = 120.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "thresholds.memory"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.monitor.check_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_cpu_window_longer_than_timeout() {
        let mut config = Config::default();
        config.monitor.cpu_sample_millis = 10_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "monitor.cpu_sample_millis"
        ));
    }

    #[test]
    fn test_validate_rejects_overflowing_minutes() {
        let mut config = Config::default();
        config.monitor.sustained_minutes = u64::MAX / 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "monitor.sustained_minutes"
        ));

        let mut config = Config::default();
        config.monitor.cooldown_minutes = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "monitor.cooldown_minutes"
        ));

        // Largest value that still converts is accepted
        config.monitor.cooldown_minutes = u64::MAX / 60;
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.cooldown().as_secs(), u64::MAX / 60 * 60);
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = Config::default();
        config.notifier.webhook_url = "ftp://hooks.example.com".to_string();
        assert!(config.validate().is_err());

        config.notifier.webhook_url = "https://hooks.example.com/T000".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
