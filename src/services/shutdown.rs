//! Cooperative shutdown signalling
//!
//! The continuous loop checks the flag between cycles and sleeps in short
//! slices so a signal interrupts the wait promptly.

use crate::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of interruptible sleeps
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared stop flag
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    stopped: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for up to `duration`; returns `true` if interrupted by a stop
    ///
    /// A duration too large to represent as a deadline waits for the stop
    /// alone.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.is_triggered() {
                return true;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    POLL_INTERVAL.min(deadline - now)
                }
                None => POLL_INTERVAL,
            };
            thread::sleep(slice);
        }
    }

    /// Trigger on SIGINT/SIGTERM
    pub fn install_signal_handler(&self) -> Result<(), AppError> {
        let shutdown = self.clone();
        ctrlc::set_handler(move || {
            log::info!("Received shutdown signal");
            shutdown.trigger();
        })?;
        Ok(())
    }
}
