//! Test-webhook command implementation
//!
//! Sends a status message so an operator can confirm the webhook works
//! before relying on it for alerts.

use crate::cli::output::{print_output, Message};
use crate::cli::Cli;
use crate::commands::{build_readonly_monitor, load_config};
use crate::error::{DeliveryError, Result};

/// Send the status message to the configured webhook
pub fn run_test_webhook(cli: &Cli) -> Result<()> {
    let (config, _) = load_config(cli, None)?;
    if config.notifier.webhook_url.trim().is_empty() {
        return Err(DeliveryError::NotConfigured.into());
    }

    let mut monitor = build_readonly_monitor(&config)?;
    let report = monitor.send_status()?;

    let msg = Message::ok(format!(
        "Status message for {} sent ({})",
        report.host.display(),
        report
            .readings
            .iter()
            .map(|r| format!("{} {}", r.metric, r.formatted()))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    print_output(&msg, cli.format)?;

    Ok(())
}
