//! Unified error types for hostwatch
//!
//! This module defines all error types used throughout the application.
//! Collaborator failures are split by class so the monitor loop can decide,
//! per call, whether to skip a metric, keep an alert record, or carry on
//! without persisting.

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A metric could not be sampled
    #[error("Metric source error: {0}")]
    Source(#[from] SourceError),

    /// A notification could not be delivered
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Monitor state could not be loaded or saved
    #[error("State persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Signal handler could not be installed
    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from reading a metric (skip that metric for this cycle)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No mounted filesystem contains the partition path
    #[error("No mounted filesystem found for partition {0}")]
    PartitionNotFound(String),

    /// The filesystem reports zero capacity
    #[error("Filesystem for {0} reports zero capacity")]
    EmptyFilesystem(String),

    /// The read did not complete within the configured timeout
    #[error("Reading {key} timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    /// An earlier read of the same metric has not returned yet
    #[error("Previous read of {0} is still running")]
    Busy(String),

    /// The sampling worker went away without answering
    #[error("Sampling worker for {0} terminated unexpectedly")]
    WorkerLost(String),

    /// Backend-specific failure
    #[error("Failed to read {key}: {message}")]
    Backend { key: String, message: String },
}

/// Errors from delivering a notification (leave alert history untouched)
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// No webhook URL configured
    #[error("Webhook URL not configured")]
    NotConfigured,

    /// HTTP transport failure (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Errors from loading or saving monitor state
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO error on the state file
    #[error("State file IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// State could not be encoded or decoded
    #[error("State file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Persisted schema version is not understood
    #[error("State file {path} has schema version {found} (expected {expected})")]
    SchemaMismatch {
        path: String,
        found: u32,
        expected: u32,
    },

    /// Another process holds the state lock
    #[error("State file {0} is locked by another hostwatch process")]
    Locked(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config file already exists and overwrite was not requested
    #[error("Configuration file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Shorthand for an invalid value error
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
