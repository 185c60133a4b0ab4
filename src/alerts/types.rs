//! Alert system domain types
//!
//! Defines metric identities, per-metric breach state, alert history records
//! and the transitions reported by the threshold tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DISK_PREFIX: &str = "disk:";

/// Category of a monitored quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Global CPU utilization
    Cpu,
    /// Physical memory in use
    Memory,
    /// Space used on a disk partition
    Disk,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
        }
    }
}

/// Identity under which breach and alert state is tracked
///
/// Serialized as `cpu`, `memory` or `disk:<partition-path>`. Partition paths
/// are kept verbatim, so `/data` and `/data/` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MetricKey {
    Cpu,
    Memory,
    Disk(String),
}

impl MetricKey {
    /// Key for a disk partition
    pub fn disk(partition: impl Into<String>) -> Self {
        Self::Disk(partition.into())
    }

    /// Category of this key
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Cpu => MetricKind::Cpu,
            Self::Memory => MetricKind::Memory,
            Self::Disk(_) => MetricKind::Disk,
        }
    }

    /// Partition path for disk keys
    pub fn partition(&self) -> Option<&str> {
        match self {
            Self::Disk(path) => Some(path),
            _ => None,
        }
    }

    /// Short human label used in messages ("cpu", "memory", or the path)
    pub fn label(&self) -> &str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Disk(path) => path,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Memory => write!(f, "memory"),
            Self::Disk(path) => write!(f, "{}{}", DISK_PREFIX, path),
        }
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Self::Cpu),
            "memory" => Ok(Self::Memory),
            _ => match s.strip_prefix(DISK_PREFIX) {
                Some("") => Err("disk metric key has an empty partition path".to_string()),
                Some(path) => Ok(Self::Disk(path.to_string())),
                None => Err(format!("unknown metric key: {}", s)),
            },
        }
    }
}

impl From<MetricKey> for String {
    fn from(key: MetricKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for MetricKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Breach state for one metric key
///
/// A breach is active exactly when it has a start time, so the two can
/// never disagree. The persisted form still carries an explicit `active`
/// flag; inconsistent records are read back as inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BreachRecord", into = "BreachRecord")]
pub struct BreachState {
    since: Option<DateTime<Utc>>,
}

impl BreachState {
    /// A breach that began at `at`
    pub fn started(at: DateTime<Utc>) -> Self {
        Self { since: Some(at) }
    }

    /// Whether the metric is currently above its threshold
    pub fn active(&self) -> bool {
        self.since.is_some()
    }

    /// Start of the current continuous breach
    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BreachRecord {
    active: bool,
    #[serde(default)]
    since: Option<DateTime<Utc>>,
}

impl From<BreachRecord> for BreachState {
    fn from(record: BreachRecord) -> Self {
        if record.active {
            Self {
                since: record.since,
            }
        } else {
            Self::default()
        }
    }
}

impl From<BreachState> for BreachRecord {
    fn from(state: BreachState) -> Self {
        Self {
            active: state.active(),
            since: state.since,
        }
    }
}

/// Alert history for one metric key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Most recent successfully delivered notification
    #[serde(default)]
    pub last_sent: Option<DateTime<Utc>>,
}

/// Result of feeding one sample into the threshold tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BreachTransition {
    /// Below threshold, and was already below
    Normal,
    /// Crossed the threshold this sample; timer starts now
    BreachStarted,
    /// Still above threshold, sustained duration not yet reached
    BreachPending {
        #[serde(with = "duration_secs")]
        elapsed: Duration,
    },
    /// Above threshold for at least the sustained duration
    SustainedBreach {
        since: DateTime<Utc>,
        #[serde(with = "duration_secs")]
        elapsed: Duration,
    },
    /// Dropped below threshold after breaching
    BreachEnded {
        #[serde(with = "duration_secs")]
        lasted: Duration,
    },
}

impl BreachTransition {
    /// Whether this transition may lead to a notification
    pub fn is_alert_candidate(&self) -> bool {
        matches!(self, Self::SustainedBreach { .. })
    }
}

impl fmt::Display for BreachTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::BreachStarted => write!(f, "breach started"),
            Self::BreachPending { elapsed } => {
                write!(f, "pending ({})", format_duration(*elapsed))
            }
            Self::SustainedBreach { elapsed, .. } => {
                write!(f, "sustained ({})", format_duration(*elapsed))
            }
            Self::BreachEnded { lasted } => {
                write!(f, "recovered after {}", format_duration(*lasted))
            }
        }
    }
}

/// Non-negative time between two wall-clock instants
///
/// Timestamps are persisted and re-read across restarts, so `earlier` may
/// lie after `now` when the clock was adjusted; that counts as zero.
pub fn elapsed_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - earlier).to_std().unwrap_or(Duration::ZERO)
}

/// Compact duration formatting ("45s", "14m", "3h05m")
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (hours, mins, rem) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h{:02}m", hours, mins)
    } else if mins > 0 {
        format!("{}m", mins)
    } else {
        format!("{}s", rem)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(d.as_secs())
    }
}
