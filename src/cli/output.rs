//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::alerts::{elapsed_between, format_duration, BreachTransition, StatusReport};
use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::services::{AlertOutcome, CycleReport, MetricOutcome};
use crate::state::MonitorState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

fn value_text(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn timestamp_text(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn outcome_line(outcome: &MetricOutcome) -> String {
    let state = match (&outcome.transition, &outcome.error) {
        (Some(transition), _) => transition.to_string(),
        (None, Some(error)) => format!("skipped: {}", error),
        (None, None) => "skipped".to_string(),
    };
    let alert = match &outcome.alert {
        AlertOutcome::NotRequired => String::new(),
        AlertOutcome::Sent => ", alert sent".to_string(),
        AlertOutcome::Suppressed {
            eligible_after: Some(at),
        } => format!(", alert suppressed until {}", timestamp_text(*at)),
        AlertOutcome::Suppressed { eligible_after: None } => ", alert suppressed".to_string(),
        AlertOutcome::Failed { error } => format!(", alert failed: {}", error),
    };

    format!(
        "  {:<20} {:>7} / {:>5}%  {}{}",
        outcome.metric.to_string(),
        value_text(outcome.value),
        outcome.threshold,
        state,
        alert
    )
}

impl TableDisplay for CycleReport {
    fn to_table(&self) -> String {
        let mut output = format!("{} at {}\n", self.host, timestamp_text(self.timestamp));
        for outcome in &self.outcomes {
            output.push_str(&outcome_line(outcome));
            output.push('\n');
        }
        if !self.persisted {
            output.push_str("  (state could not be saved)\n");
        }
        output
    }

    fn to_compact(&self) -> String {
        self.outcomes
            .iter()
            .map(|o| {
                let flag = match (&o.transition, &o.alert) {
                    (_, AlertOutcome::Sent) => "!",
                    (Some(BreachTransition::Normal), _)
                    | (Some(BreachTransition::BreachEnded { .. }), _) => "",
                    (Some(_), _) => "*",
                    (None, _) => "?",
                };
                format!("{}={}{}", o.metric, value_text(o.value), flag)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TableDisplay for StatusReport {
    fn to_table(&self) -> String {
        let mut output = format!("Host: {}\n", self.host.display());
        output.push_str(&format!("IP Address: {}\n", self.host.ip_address));
        if let Some(cloud) = &self.host.cloud {
            if let Some(instance_type) = &cloud.instance_type {
                output.push_str(&format!("Instance Type: {}\n", instance_type));
            }
            if let Some(zone) = &cloud.availability_zone {
                output.push_str(&format!("Availability Zone: {}\n", zone));
            }
        }
        for reading in &self.readings {
            output.push_str(&format!(
                "  {:<20} {:>7}\n",
                reading.metric.to_string(),
                reading.formatted()
            ));
        }
        output
    }

    fn to_compact(&self) -> String {
        self.readings
            .iter()
            .map(|r| format!("{}={}", r.metric, r.formatted()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Persisted state for display
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub path: PathBuf,
    #[serde(flatten)]
    pub state: MonitorState,
    /// Display reference time for breach ages
    #[serde(skip)]
    pub now: DateTime<Utc>,
}

impl TableDisplay for StateView {
    fn to_table(&self) -> String {
        let mut output = format!("State file: {}\n", self.path.display());
        if self.state.is_empty() {
            output.push_str("No breach or alert history\n");
            return output;
        }

        output.push_str("Breaches:\n");
        let mut any = false;
        for (key, breach) in self.state.active_breaches() {
            if let Some(since) = breach.since() {
                any = true;
                output.push_str(&format!(
                    "  {:<20} since {} ({})\n",
                    key.to_string(),
                    timestamp_text(since),
                    format_duration(elapsed_between(since, self.now))
                ));
            }
        }
        if !any {
            output.push_str("  none active\n");
        }

        output.push_str("Last alerts:\n");
        let mut any = false;
        for (key, record) in &self.state.alerts {
            if let Some(at) = record.last_sent {
                any = true;
                output.push_str(&format!(
                    "  {:<20} {}\n",
                    key.to_string(),
                    timestamp_text(at)
                ));
            }
        }
        if !any {
            output.push_str("  none sent\n");
        }

        output
    }

    fn to_compact(&self) -> String {
        let active: Vec<String> = self
            .state
            .active_breaches()
            .map(|(key, _)| key.to_string())
            .collect();
        if active.is_empty() {
            "no active breaches".to_string()
        } else {
            format!("active: {}", active.join(", "))
        }
    }
}

/// Effective configuration for display
#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(flatten)]
    pub config: Config,
}

impl TableDisplay for ConfigView {
    fn to_table(&self) -> String {
        let header = match &self.source {
            Some(path) => format!("# Loaded from {}\n", path.display()),
            None => "# Built-in defaults (no configuration file found)\n".to_string(),
        };
        let body = self
            .config
            .to_toml()
            .unwrap_or_else(|e| format!("# {}\n", e));
        format!("{}{}", header, body)
    }

    fn to_compact(&self) -> String {
        format!(
            "cpu={}% memory={}% disk={}% sustained={}m cooldown={}m interval={}s partitions={}",
            self.config.thresholds.cpu,
            self.config.thresholds.memory,
            self.config.thresholds.disk,
            self.config.monitor.sustained_minutes,
            self.config.monitor.cooldown_minutes,
            self.config.monitor.check_interval_secs,
            self.config.monitor.disk_partitions.join(",")
        )
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl Message {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertRecord, BreachState, MetricKey, Reading};
    use crate::host::HostIdentity;
    use chrono::TimeZone;
    use std::time::Duration;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 20, h, m, 0).unwrap()
    }

    fn report() -> CycleReport {
        CycleReport {
            timestamp: at(10, 0),
            host: "web-1".to_string(),
            outcomes: vec![
                MetricOutcome {
                    metric: MetricKey::Cpu,
                    threshold: 90.0,
                    value: Some(96.2),
                    transition: Some(BreachTransition::SustainedBreach {
                        since: at(9, 40),
                        elapsed: Duration::from_secs(20 * 60),
                    }),
                    alert: AlertOutcome::Sent,
                    error: None,
                },
                MetricOutcome {
                    metric: MetricKey::disk("/data"),
                    threshold: 90.0,
                    value: None,
                    transition: None,
                    alert: AlertOutcome::NotRequired,
                    error: Some("Reading disk:/data timed out after 10s".to_string()),
                },
            ],
            persisted: true,
        }
    }

    #[test]
    fn test_cycle_report_table() {
        let output = report().to_table();
        assert!(output.starts_with("web-1 at 2026-08-20 10:00:00 UTC"));
        assert!(output.contains("96.2%"));
        assert!(output.contains("sustained (20m), alert sent"));
        assert!(output.contains("skipped: Reading disk:/data timed out"));
    }

    #[test]
    fn test_cycle_report_compact() {
        assert_eq!(report().to_compact(), "cpu=96.2%! disk:/data=n/a?");
    }

    #[test]
    fn test_cycle_report_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["outcomes"][0]["alert"]["status"], "sent");
        assert_eq!(json["outcomes"][0]["transition"]["state"], "sustained_breach");
        assert_eq!(json["outcomes"][0]["transition"]["elapsed"], 1200);
        assert!(json["outcomes"][1]["value"].is_null());
    }

    #[test]
    fn test_status_report_compact() {
        let status = StatusReport {
            timestamp: at(10, 0),
            host: HostIdentity::local("web-1"),
            readings: vec![
                Reading {
                    metric: MetricKey::Cpu,
                    value: Some(3.0),
                },
                Reading {
                    metric: MetricKey::Memory,
                    value: None,
                },
            ],
        };
        assert_eq!(status.to_compact(), "cpu=3.0% memory=n/a");
        assert!(status.to_table().contains("Host: web-1"));
    }

    #[test]
    fn test_state_view() {
        let mut state = MonitorState::default();
        state
            .breaches
            .insert(MetricKey::Memory, BreachState::started(at(9, 0)));
        state.alerts.insert(
            MetricKey::Memory,
            AlertRecord {
                last_sent: Some(at(9, 15)),
            },
        );
        let view = StateView {
            path: PathBuf::from("/var/lib/hostwatch/state.json"),
            state,
            now: at(10, 30),
        };

        let output = view.to_table();
        assert!(output.contains("since 2026-08-20 09:00:00 UTC (1h30m)"));
        assert!(output.contains("2026-08-20 09:15:00 UTC"));
        assert_eq!(view.to_compact(), "active: memory");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["breaches"]["memory"]["active"], true);
    }

    #[test]
    fn test_empty_state_view() {
        let view = StateView {
            path: PathBuf::from("state.json"),
            state: MonitorState::default(),
            now: at(0, 0),
        };
        assert!(view.to_table().contains("No breach or alert history"));
    }

    #[test]
    fn test_message_display() {
        let msg = Message::ok("State reset");
        assert!(msg.to_table().starts_with('✓'));
    }
}
