//! sysinfo-backed metric source

use super::MetricSource;
use crate::alerts::MetricKey;
use crate::error::SourceError;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use sysinfo::{Disks, System};

/// Reads CPU, memory and disk utilization from the running system
pub struct SystemSource {
    system: System,
    /// Window between the two CPU refreshes
    cpu_sample: Duration,
}

impl SystemSource {
    /// Create a source that samples CPU usage over `cpu_sample`
    pub fn new(cpu_sample: Duration) -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self { system, cpu_sample }
    }

    fn cpu(&mut self) -> f64 {
        self.system.refresh_cpu_all();
        thread::sleep(self.cpu_sample.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_all();
        f64::from(self.system.global_cpu_usage())
    }

    fn memory(&mut self) -> Result<f64, SourceError> {
        self.system.refresh_memory();
        usage_percent(self.system.total_memory(), self.system.available_memory()).ok_or_else(
            || SourceError::Backend {
                key: MetricKey::Memory.to_string(),
                message: "total memory reported as zero".to_string(),
            },
        )
    }

    fn disk(&self, partition: &str) -> Result<f64, SourceError> {
        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<PathBuf> = disks
            .list()
            .iter()
            .map(|d| d.mount_point().to_path_buf())
            .collect();

        let index = select_mount(Path::new(partition), &mounts)
            .ok_or_else(|| SourceError::PartitionNotFound(partition.to_string()))?;
        let disk = &disks.list()[index];

        log::debug!(
            "Partition {} resolved to mount {}",
            partition,
            disk.mount_point().display()
        );

        usage_percent(disk.total_space(), disk.available_space())
            .ok_or_else(|| SourceError::EmptyFilesystem(partition.to_string()))
    }
}

impl MetricSource for SystemSource {
    fn read(&mut self, key: &MetricKey) -> Result<f64, SourceError> {
        match key {
            MetricKey::Cpu => Ok(self.cpu()),
            MetricKey::Memory => self.memory(),
            MetricKey::Disk(partition) => self.disk(partition),
        }
    }
}

/// Pick the mount that holds `partition`
///
/// An exact mount point wins; otherwise the deepest mount point that is a
/// path prefix of `partition`. Matching is by path component, so `/data`
/// is not a prefix of `/database`.
pub fn select_mount(partition: &Path, mounts: &[PathBuf]) -> Option<usize> {
    if let Some(exact) = mounts.iter().position(|m| m.as_path() == partition) {
        return Some(exact);
    }

    mounts
        .iter()
        .enumerate()
        .filter(|(_, m)| partition.starts_with(m))
        .max_by_key(|(_, m)| m.components().count())
        .map(|(i, _)| i)
}

/// Percentage of `total` not available; `None` for an empty total
pub fn usage_percent(total: u64, available: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available);
    Some(used as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounts(paths: &[&str]) -> Vec<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_select_mount_exact() {
        let m = mounts(&["/", "/data", "/boot"]);
        assert_eq!(select_mount(Path::new("/data"), &m), Some(1));
        assert_eq!(select_mount(Path::new("/"), &m), Some(0));
    }

    #[test]
    fn test_select_mount_longest_prefix() {
        let m = mounts(&["/", "/var", "/var/lib/docker"]);
        assert_eq!(select_mount(Path::new("/var/lib/docker/volumes"), &m), Some(2));
        assert_eq!(select_mount(Path::new("/var/log"), &m), Some(1));
        assert_eq!(select_mount(Path::new("/home/user"), &m), Some(0));
    }

    #[test]
    fn test_select_mount_is_component_wise() {
        let m = mounts(&["/", "/data"]);
        assert_eq!(select_mount(Path::new("/database"), &m), Some(0));
    }

    #[test]
    fn test_select_mount_none() {
        let m = mounts(&["/data"]);
        assert_eq!(select_mount(Path::new("/srv"), &m), None);
        assert_eq!(select_mount(Path::new("/srv"), &[]), None);
    }

    #[test]
    fn test_usage_percent() {
        assert_eq!(usage_percent(200, 50), Some(75.0));
        assert_eq!(usage_percent(100, 100), Some(0.0));
        // Available above total (reserved blocks, racing refresh) clamps to 0%
        assert_eq!(usage_percent(100, 150), Some(0.0));
        assert_eq!(usage_percent(0, 0), None);
    }
}
