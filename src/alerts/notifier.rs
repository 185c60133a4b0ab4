//! Alert notification delivery
//!
//! Defines the notification payloads and the webhook channel that posts
//! them as JSON.

use super::types::{MetricKey, MetricKind};
use crate::config::NotifierConfig;
use crate::error::DeliveryError;
use crate::host::{CloudInstance, HostIdentity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Longest response body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Notification channel trait
pub trait Notifier: Send {
    /// Deliver a notification; `Ok` only when the endpoint accepted it
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;

    /// Channel name for identification
    fn name(&self) -> &str;
}

/// Something worth telling the operator about
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A sustained threshold breach
    Alert(AlertPayload),
    /// A one-off summary of current readings
    Status(StatusReport),
}

/// Structured alert for a sustained breach
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertPayload {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    /// Display identity (instance name or id when known)
    pub host: String,
    pub ip_address: String,
    pub metric: MetricKey,
    pub alert_type: MetricKind,
    pub current_value: f64,
    pub threshold: f64,
    pub message: String,
    pub partition: Option<String>,
    pub cloud: Option<CloudInstance>,
}

impl AlertPayload {
    /// Build the alert for `key` at `value` against `threshold`
    pub fn new(
        key: &MetricKey,
        value: f64,
        threshold: f64,
        host: &HostIdentity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let server = host.display();
        let kind = key.kind();
        let message = format!(
            "🚨 {} ALERT on {}: {} usage is {:.1}% (threshold: {}%)",
            kind.to_string().to_uppercase(),
            server,
            key.label(),
            value,
            threshold
        );

        Self {
            timestamp,
            hostname: host.hostname.clone(),
            host: server,
            ip_address: host.ip_address.clone(),
            metric: key.clone(),
            alert_type: kind,
            current_value: value,
            threshold,
            message,
            partition: key.partition().map(str::to_string),
            cloud: host.cloud.clone(),
        }
    }
}

/// One metric reading in a status report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub metric: MetricKey,
    /// `None` when the metric could not be sampled
    pub value: Option<f64>,
}

impl Reading {
    /// Value formatted as a percentage, or "n/a"
    pub fn formatted(&self) -> String {
        self.value
            .map(|v| format!("{:.1}%", v))
            .unwrap_or_else(|| "n/a".to_string())
    }
}

/// Current status of the host, used for the test notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub timestamp: DateTime<Utc>,
    pub host: HostIdentity,
    pub readings: Vec<Reading>,
}

impl StatusReport {
    /// Headline text
    pub fn summary(&self) -> String {
        let server = match self.host.cloud.as_ref().and_then(|c| c.instance_name.as_ref()) {
            Some(name) if self.host.display_name.is_none() => name.clone(),
            _ => self.host.display(),
        };
        let readings = self
            .readings
            .iter()
            .map(|r| format!("{} {}", reading_title(&r.metric), r.formatted()))
            .collect::<Vec<_>>()
            .join(" | ");
        format!(
            "✅ Server '{}' added to monitoring\nCurrent status: {}",
            server, readings
        )
    }
}

fn reading_title(key: &MetricKey) -> String {
    match key {
        MetricKey::Cpu => "CPU".to_string(),
        MetricKey::Memory => "Memory".to_string(),
        MetricKey::Disk(path) => format!("Disk {}", path),
    }
}

/// Webhook notifier
///
/// Posts alerts as flat JSON documents and status reports in the
/// attachment layout most chat webhooks accept.
pub struct WebhookNotifier {
    url: String,
    username: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    /// Create a webhook notifier with a bounded request timeout
    pub fn new(config: &NotifierConfig) -> Result<Self, DeliveryError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("hostwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;

        Ok(Self {
            url: config.webhook_url.trim().to_string(),
            username: config.username.clone(),
            client,
        })
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Render the JSON body for a notification
    pub fn render(&self, notification: &Notification) -> Value {
        match notification {
            Notification::Alert(payload) => json!(payload),
            Notification::Status(report) => self.render_status(report),
        }
    }

    fn render_status(&self, report: &StatusReport) -> Value {
        let short =
            |title: &str, value: String| json!({ "title": title, "value": value, "short": true });

        let mut fields = vec![
            short("Server", report.host.display()),
            short("IP Address", report.host.ip_address.clone()),
        ];
        for reading in &report.readings {
            let title = format!("{} Usage", reading_title(&reading.metric));
            fields.push(short(&title, reading.formatted()));
        }
        if let Some(cloud) = &report.host.cloud {
            if let Some(instance_type) = &cloud.instance_type {
                fields.push(short("Instance Type", instance_type.clone()));
            }
            if let Some(zone) = &cloud.availability_zone {
                fields.push(short("Availability Zone", zone.clone()));
            }
        }

        json!({
            "text": report.summary(),
            "username": self.username,
            "icon_emoji": ":computer:",
            "attachments": [{ "color": "good", "fields": fields }],
        })
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if self.url.is_empty() {
            return Err(DeliveryError::NotConfigured);
        }

        let body = self.render(notification);
        let response = self.client.post(&self.url).json(&body).send()?;

        let status = response.status();
        if status.is_success() {
            log::debug!("Webhook accepted notification (HTTP {})", status.as_u16());
            return Ok(());
        }

        let mut body = response.text().unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
