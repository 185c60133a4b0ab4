//! Bounded metric reads
//!
//! Filesystem stats on a dead network mount can block indefinitely. Each
//! read runs on a short-lived worker thread and the caller waits at most
//! the configured timeout for the answer.

use super::MetricSource;
use crate::alerts::MetricKey;
use crate::error::SourceError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

type SourceFactory<S> = Box<dyn Fn() -> S + Send>;

/// One inner source per metric key plus its in-flight flag
struct Lane<S> {
    source: Arc<Mutex<S>>,
    busy: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the worker finishes, panics, or is
/// never started
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wraps a source so that no read takes longer than `timeout`
///
/// Every metric key gets its own inner source, so a hung disk read only
/// stalls that key. While a key's previous read is still running, further
/// reads of it fail with [`SourceError::Busy`] without spawning a thread.
pub struct TimeoutSource<S> {
    make: SourceFactory<S>,
    lanes: HashMap<MetricKey, Lane<S>>,
    timeout: Duration,
}

impl<S: MetricSource + 'static> TimeoutSource<S> {
    /// `make` builds the inner source for each key on first use
    pub fn new(make: impl Fn() -> S + Send + 'static, timeout: Duration) -> Self {
        Self {
            make: Box::new(make),
            lanes: HashMap::new(),
            timeout,
        }
    }

    /// Whether a read of `key` is still running
    pub fn in_flight(&self, key: &MetricKey) -> bool {
        self.lanes
            .get(key)
            .is_some_and(|lane| lane.busy.load(Ordering::Acquire))
    }
}

impl<S: MetricSource + 'static> MetricSource for TimeoutSource<S> {
    fn read(&mut self, key: &MetricKey) -> Result<f64, SourceError> {
        let make = &self.make;
        let lane = self.lanes.entry(key.clone()).or_insert_with(|| Lane {
            source: Arc::new(Mutex::new(make())),
            busy: Arc::new(AtomicBool::new(false)),
        });

        if lane.busy.swap(true, Ordering::AcqRel) {
            log::debug!("Previous read of {} still running", key);
            return Err(SourceError::Busy(key.to_string()));
        }
        let guard = InFlight(Arc::clone(&lane.busy));

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&lane.source);
        let worker_key = key.clone();

        thread::Builder::new()
            .name(format!("read-{}", key))
            .spawn(move || {
                // Locals drop in reverse, so the flag clears before the
                // sender goes away, even on panic
                let tx = tx;
                let guard = guard;
                let result = inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .read(&worker_key);
                drop(guard);
                // The receiver is gone if the caller already timed out
                let _ = tx.send(result);
            })
            .map_err(|e| SourceError::Backend {
                key: key.to_string(),
                message: format!("failed to spawn sampling thread: {}", e),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SourceError::Timeout {
                key: key.to_string(),
                timeout: self.timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(SourceError::WorkerLost(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct SlowSource {
        delay: Duration,
        value: f64,
    }

    impl MetricSource for SlowSource {
        fn read(&mut self, _key: &MetricKey) -> Result<f64, SourceError> {
            thread::sleep(self.delay);
            Ok(self.value)
        }
    }

    struct PanickingSource;

    impl MetricSource for PanickingSource {
        fn read(&mut self, _key: &MetricKey) -> Result<f64, SourceError> {
            panic!("sampler crashed");
        }
    }

    /// Blocks on disk keys until released; counts every read started
    struct StuckDisk {
        started: Arc<AtomicUsize>,
        release: Arc<AtomicBool>,
    }

    impl MetricSource for StuckDisk {
        fn read(&mut self, key: &MetricKey) -> Result<f64, SourceError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if matches!(key, MetricKey::Disk(_)) {
                while !self.release.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(5));
                }
            }
            Ok(12.5)
        }
    }

    fn slow(delay: Duration) -> impl Fn() -> SlowSource + Send + 'static {
        move || SlowSource { delay, value: 42.0 }
    }

    #[test]
    fn test_fast_read_passes_through() {
        let mut source = TimeoutSource::new(slow(Duration::ZERO), Duration::from_secs(5));
        assert_eq!(source.read(&MetricKey::Cpu), Ok(42.0));
        assert!(!source.in_flight(&MetricKey::Cpu));
    }

    #[test]
    fn test_slow_read_times_out() {
        let mut source =
            TimeoutSource::new(slow(Duration::from_millis(500)), Duration::from_millis(20));
        assert_eq!(
            source.read(&MetricKey::disk("/mnt/nfs")),
            Err(SourceError::Timeout {
                key: "disk:/mnt/nfs".to_string(),
                timeout: Duration::from_millis(20),
            })
        );
    }

    #[test]
    fn test_sub_second_timeout_is_reported_in_millis() {
        let mut source =
            TimeoutSource::new(slow(Duration::from_millis(500)), Duration::from_millis(50));
        let err = source.read(&MetricKey::Memory).unwrap_err();
        assert_eq!(err.to_string(), "Reading memory timed out after 50ms");
    }

    #[test]
    fn test_hung_disk_does_not_block_other_metrics() {
        let started = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(AtomicBool::new(false));
        let (s, r) = (Arc::clone(&started), Arc::clone(&release));
        let mut source = TimeoutSource::new(
            move || StuckDisk {
                started: Arc::clone(&s),
                release: Arc::clone(&r),
            },
            Duration::from_millis(50),
        );
        let nfs = MetricKey::disk("/mnt/nfs");

        assert!(matches!(source.read(&nfs), Err(SourceError::Timeout { .. })));
        assert!(source.in_flight(&nfs));

        for _ in 0..20 {
            assert_eq!(source.read(&MetricKey::Cpu), Ok(12.5));
            assert_eq!(source.read(&MetricKey::Memory), Ok(12.5));
            // No new worker while the disk read is stuck
            assert_eq!(source.read(&nfs), Err(SourceError::Busy("disk:/mnt/nfs".to_string())));
        }
        assert_eq!(started.load(Ordering::SeqCst), 41);

        release.store(true, Ordering::SeqCst);
        for _ in 0..100 {
            if !source.in_flight(&nfs) {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!source.in_flight(&nfs));
        assert_eq!(source.read(&nfs), Ok(12.5));
    }

    #[test]
    fn test_inner_errors_pass_through() {
        struct Failing;
        impl MetricSource for Failing {
            fn read(&mut self, key: &MetricKey) -> Result<f64, SourceError> {
                Err(SourceError::PartitionNotFound(key.label().to_string()))
            }
        }

        let mut source = TimeoutSource::new(|| Failing, Duration::from_secs(5));
        assert_eq!(
            source.read(&MetricKey::disk("/data")),
            Err(SourceError::PartitionNotFound("/data".to_string()))
        );
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let mut source = TimeoutSource::new(|| PanickingSource, Duration::from_secs(5));
        assert_eq!(
            source.read(&MetricKey::Memory),
            Err(SourceError::WorkerLost("memory".to_string()))
        );
        // A poisoned lock does not wedge later reads
        assert_eq!(
            source.read(&MetricKey::Memory),
            Err(SourceError::WorkerLost("memory".to_string()))
        );
    }
}
