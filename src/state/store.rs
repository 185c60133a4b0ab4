//! JSON state file storage
//!
//! Saves go through a temporary file in the same directory followed by a
//! rename, so a crash mid-write leaves either the old file or the new one.

use super::{MonitorState, STATE_VERSION};
use crate::error::PersistenceError;
use fs2::FileExt;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Durable storage for [`MonitorState`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

/// Exclusive hold on a state file; released on drop
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::debug!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}

#[derive(Deserialize)]
struct VersionHeader {
    version: Option<u32>,
}

impl StateStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default state file location
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("hostwatch").join("state.json"))
            .unwrap_or_else(|| std::env::temp_dir().join("hostwatch_state.json"))
    }

    /// State file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state, falling back to empty state on any problem
    ///
    /// A missing file is the normal first-run case. An unreadable or
    /// unparseable file is reported and, when it is unparseable, moved
    /// aside to `<path>.corrupt` for inspection.
    pub fn load(&self) -> MonitorState {
        match self.try_load() {
            Ok(Some(state)) => {
                log::debug!(
                    "Loaded state from {} ({} breach, {} alert records)",
                    self.path.display(),
                    state.breaches.len(),
                    state.alerts.len()
                );
                state
            }
            Ok(None) => {
                log::debug!("No state file at {}, starting fresh", self.path.display());
                MonitorState::default()
            }
            Err(e) => {
                log::warn!("{}; breach and alert history reset", e);
                if matches!(
                    e,
                    PersistenceError::Json { .. } | PersistenceError::SchemaMismatch { .. }
                ) {
                    self.quarantine();
                }
                MonitorState::default()
            }
        }
    }

    /// Load state, reporting problems to the caller
    ///
    /// Returns `Ok(None)` when no state file exists.
    pub fn try_load(&self) -> Result<Option<MonitorState>, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let header: VersionHeader = serde_json::from_str(&content).map_err(|e| self.json_error(e))?;
        if header.version != Some(STATE_VERSION) {
            return Err(PersistenceError::SchemaMismatch {
                path: self.path.display().to_string(),
                found: header.version.unwrap_or(0),
                expected: STATE_VERSION,
            });
        }

        let state = serde_json::from_str(&content).map_err(|e| self.json_error(e))?;
        Ok(Some(state))
    }

    /// Atomically replace the state file
    pub fn save(&self, state: &MonitorState) -> Result<(), PersistenceError> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        serde_json::to_writer_pretty(&mut tmp, state).map_err(|e| self.json_error(e))?;
        tmp.write_all(b"\n").map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    /// Delete the state file; returns whether one existed
    pub fn reset(&self) -> Result<bool, PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Take the single-writer lock for this state file
    pub fn lock(&self) -> Result<StateLock, PersistenceError> {
        let path = self.sibling("lock");
        fs::create_dir_all(self.parent_dir()).map_err(|e| self.io_error(e))?;

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| self.io_error(e))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                log::debug!("Acquired state lock at {}", path.display());
                Ok(StateLock { file, path })
            }
            Err(_) => Err(PersistenceError::Locked(self.path.display().to_string())),
        }
    }

    /// Path of the quarantined copy of a corrupt state file
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling("corrupt")
    }

    fn quarantine(&self) {
        let target = self.corrupt_path();
        match fs::rename(&self.path, &target) {
            Ok(()) => log::warn!("Moved unreadable state file to {}", target.display()),
            Err(e) => log::warn!(
                "Failed to move unreadable state file {} aside: {}",
                self.path.display(),
                e
            ),
        }
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// `<path>.<suffix>`
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> PersistenceError {
        PersistenceError::Json {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertRecord, BreachState, MetricKey};
    use chrono::{TimeZone, Utc};

    fn sample_state() -> MonitorState {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
        let mut state = MonitorState::default();
        state.breaches.insert(MetricKey::Cpu, BreachState::started(at));
        state
            .breaches
            .insert(MetricKey::disk("/data"), BreachState::default());
        state.alerts.insert(
            MetricKey::disk("/data"),
            AlertRecord {
                last_sent: Some(at),
            },
        );
        state
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.try_load().unwrap().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));
        let state = sample_state();

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_save_replaces_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save(&sample_state()).unwrap();
        store.save(&MonitorState::default()).unwrap();
        assert!(store.load().is_empty());

        // Only the state file remains; no temp files are left behind
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"version\": 1, \"breaches\": {\"cpu\": ").unwrap();

        let store = StateStore::new(&path);
        assert!(matches!(
            store.try_load(),
            Err(PersistenceError::Json { .. })
        ));
        assert!(store.load().is_empty());
        assert!(!path.exists());
        assert!(store.corrupt_path().exists());
    }

    #[test]
    fn test_schema_mismatch_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"version": 99, "breaches": {}, "alerts": {}}"#).unwrap();

        let store = StateStore::new(&path);
        assert!(matches!(
            store.try_load(),
            Err(PersistenceError::SchemaMismatch { found: 99, .. })
        ));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_legacy_layout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"cpu_high_since": null, "memory_high_since": null, "disk_high_since": {}, "last_alert_sent": {}}"#,
        )
        .unwrap();

        let store = StateStore::new(&path);
        assert!(matches!(
            store.try_load(),
            Err(PersistenceError::SchemaMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn test_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(!store.reset().unwrap());
        store.save(&sample_state()).unwrap();
        assert!(store.reset().unwrap());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        let lock = store.lock().unwrap();
        assert!(lock.path().ends_with("state.json.lock"));
        assert!(matches!(store.lock(), Err(PersistenceError::Locked(_))));

        drop(lock);
        assert!(store.lock().is_ok());
    }
}
