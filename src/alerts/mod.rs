//! Alert and notification system
//!
//! Provides sustained-threshold detection, cooldown deduplication and
//! webhook delivery.

mod gate;
mod notifier;
mod tracker;
mod types;

pub use gate::AlertGate;
pub use notifier::{AlertPayload, Notification, Notifier, Reading, StatusReport, WebhookNotifier};
pub use tracker::ThresholdTracker;
pub use types::{
    elapsed_between, format_duration, AlertRecord, BreachState, BreachTransition, MetricKey,
    MetricKind,
};
