//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod check;
pub mod config;
pub mod notify;
pub mod run;
pub mod state;
pub mod status;

pub use check::run_check;
pub use config::run_config;
pub use notify::run_test_webhook;
pub use run::run_continuous;
pub use state::run_state;
pub use status::run_status;

use crate::alerts::WebhookNotifier;
use crate::cli::Cli;
use crate::config::{Config, ConfigBuilder};
use crate::error::Result;
use crate::host::HostIdentity;
use crate::services::{Monitor, ThresholdConfig};
use crate::source::{SystemSource, TimeoutSource};
use crate::state::{MonitorState, StateStore};

use std::path::{Path, PathBuf};

/// Monitor wired to the real system and webhook
pub type SystemMonitor = Monitor<TimeoutSource<SystemSource>, WebhookNotifier>;

/// Resolve the effective configuration and the file it came from
pub(crate) fn load_config(cli: &Cli, interval: Option<u64>) -> Result<(Config, Option<PathBuf>)> {
    let builder = ConfigBuilder::new().with_file(cli.config.as_deref())?;
    let source = builder.source().map(Path::to_path_buf);

    let config = builder
        .with_interval(interval)
        .with_webhook_url(cli.webhook_url.clone())
        .with_state_path(cli.state.clone())
        .with_partitions(cli.partitions.clone())
        .build()?;

    Ok((config, source))
}

/// Build a monitor over the local system, resuming persisted state
pub(crate) fn build_monitor(config: &Config) -> Result<SystemMonitor> {
    build(config, true)
}

/// Build a monitor that never reads or moves the state file
///
/// For commands that only sample, so they cannot disturb a running daemon.
pub(crate) fn build_readonly_monitor(config: &Config) -> Result<SystemMonitor> {
    build(config, false)
}

fn build(config: &Config, resume: bool) -> Result<SystemMonitor> {
    let cpu_sample = config.monitor.cpu_sample();
    let source = TimeoutSource::new(
        move || SystemSource::new(cpu_sample),
        config.monitor.source_timeout(),
    );

    let notifier = WebhookNotifier::new(&config.notifier)?;
    if notifier.url().is_empty() {
        log::warn!("No webhook URL configured; alerts will be logged but not delivered");
    }

    let host = HostIdentity::resolve(&config.host);
    log::debug!("Monitoring as {} ({})", host.display(), host.ip_address);

    let store = StateStore::new(config.state_path());
    let thresholds = ThresholdConfig::from_config(config);
    if resume {
        Ok(Monitor::new(thresholds, source, notifier, host, store))
    } else {
        Ok(Monitor::with_state(
            thresholds,
            source,
            notifier,
            host,
            store,
            MonitorState::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readonly_monitor_leaves_corrupt_state_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut config = Config::default();
        config.host.cloud_metadata = false;
        config.state.path = Some(path.clone());

        let monitor = build_readonly_monitor(&config).unwrap();
        assert!(monitor.snapshot().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
        assert!(!dir.path().join("state.json.corrupt").exists());
    }

    #[test]
    fn test_monitor_quarantines_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut config = Config::default();
        config.host.cloud_metadata = false;
        config.state.path = Some(path.clone());

        build_monitor(&config).unwrap();
        assert!(!path.exists());
        assert!(dir.path().join("state.json.corrupt").exists());
    }
}
