use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Quality of the time reported by the precise time provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeStatus {
    Ok,
    DriftWarning,
    SystemOnly,
    Stale,
}

/// Point-in-time reading of the precise time provider
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSnapshot {
    pub status: TimeStatus,
    /// Network-synchronized time, extrapolated from the last anchor
    pub reference_time: Option<DateTime<Utc>>,
    /// Raw device wall clock
    pub local_time: DateTime<Utc>,
    pub time_since_sync: Option<Duration>,
    /// Device clock minus reference time
    pub drift: Option<TimeDelta>,
}

impl TimeSnapshot {
    pub fn system_only(local_time: DateTime<Utc>) -> Self {
        Self {
            status: TimeStatus::SystemOnly,
            reference_time: None,
            local_time,
            time_since_sync: None,
            drift: None,
        }
    }

    /// Best available absolute time
    pub fn time(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or(self.local_time)
    }
}
