//! Metric sources
//!
//! A [`MetricSource`] turns a metric key into a utilization percentage. The
//! monitor only sees this trait; the sysinfo-backed implementation and the
//! timeout wrapper live in submodules.

mod system;
mod timeout;

pub use system::{select_mount, usage_percent, SystemSource};
pub use timeout::TimeoutSource;

use crate::alerts::MetricKey;
use crate::error::SourceError;

/// Source of utilization percentages (0-100)
pub trait MetricSource: Send {
    /// Sample the current value for `key`
    fn read(&mut self, key: &MetricKey) -> Result<f64, SourceError>;
}

impl<S: MetricSource + ?Sized> MetricSource for Box<S> {
    fn read(&mut self, key: &MetricKey) -> Result<f64, SourceError> {
        (**self).read(key)
    }
}
