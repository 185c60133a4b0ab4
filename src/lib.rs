//! hostwatch - host resource monitor
//!
//! This library samples CPU, memory and disk usage, detects breaches that
//! stay above their threshold for a sustained period, and posts webhook
//! alerts with a cooldown so one incident does not flood the channel.
//!
//! # Modules
//!
//! - [`alerts`]: Breach tracking, alert deduplication and notifiers
//! - [`cli`]: Command-line interface definitions
//! - [`clock`]: Wall-clock abstraction
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`error`]: Error types
//! - [`host`]: Host identity and cloud metadata
//! - [`services`]: Check-cycle monitor and shutdown handling
//! - [`source`]: Metric sources
//! - [`state`]: State persistence

pub mod alerts;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod services;
pub mod source;
pub mod state;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
