//! Service layer for resource monitoring
//!
//! The monitor runs check cycles; the shutdown flag stops the continuous
//! loop between cycles.

pub mod monitor;
pub mod shutdown;

pub use monitor::{AlertOutcome, CycleReport, MetricOutcome, MetricTarget, Monitor, ThresholdConfig};
pub use shutdown::Shutdown;
