//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
    source: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            source: None,
        }
    }

    /// Load configuration from a file
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// locations are searched and defaults are kept if none is usable.
    pub fn with_file(mut self, path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                self.config = ConfigFile::load(path)?;
                self.source = Some(path.to_path_buf());
            }
            None => {
                if let Some((config, path)) = ConfigFile::load_default() {
                    self.config = config;
                    self.source = Some(path);
                }
            }
        }
        Ok(self)
    }

    /// Override with CLI check interval
    pub fn with_interval(mut self, interval_secs: Option<u64>) -> Self {
        if let Some(i) = interval_secs {
            self.config.monitor.check_interval_secs = i;
        }
        self
    }

    /// Override with CLI webhook URL
    pub fn with_webhook_url(mut self, url: Option<String>) -> Self {
        if let Some(u) = url {
            self.config.notifier.webhook_url = u;
        }
        self
    }

    /// Override with CLI state file path
    pub fn with_state_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(p) = path {
            self.config.state.path = Some(p);
        }
        self
    }

    /// Override with CLI partitions (ignored when empty)
    pub fn with_partitions(mut self, partitions: Vec<String>) -> Self {
        if !partitions.is_empty() {
            self.config.monitor.disk_partitions = partitions;
        }
        self
    }

    /// File the configuration came from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_interval(Some(30))
            .with_webhook_url(Some("https://hooks.example.com/abc".to_string()))
            .with_state_path(Some(PathBuf::from("/var/lib/hostwatch/state.json")))
            .with_partitions(vec!["/data".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.monitor.check_interval_secs, 30);
        assert_eq!(config.notifier.webhook_url, "https://hooks.example.com/abc");
        assert_eq!(
            config.state_path(),
            PathBuf::from("/var/lib/hostwatch/state.json")
        );
        assert_eq!(config.monitor.disk_partitions, vec!["/data".to_string()]);
    }

    #[test]
    fn test_empty_partitions_keep_config() {
        let config = ConfigBuilder::new().with_partitions(vec![]).build().unwrap();
        assert_eq!(config.monitor.disk_partitions, vec!["/".to_string()]);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = ConfigBuilder::new().with_file(Some(Path::new("/nonexistent/hostwatch.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_build_validates() {
        let result = ConfigBuilder::new().with_interval(Some(0)).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_with_file_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostwatch.toml");
        std::fs::write(&path, "[thresholds]\ncpu = 75.5\n").unwrap();

        let builder = ConfigBuilder::new().with_file(Some(&path)).unwrap();
        assert_eq!(builder.source(), Some(path.as_path()));
        assert_eq!(builder.build().unwrap().thresholds.cpu, 75.5);
    }
}
