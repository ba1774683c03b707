use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::Sample;

/// Classification of a failed station fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationErrorKind {
    WrongStationLogin,
    UnknownStation,
    UnknownQuery,
    ConnectionError,
    InternalError,
    Unknown,
}

impl StationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WrongStationLogin => "wrong station login",
            Self::UnknownStation => "unknown station",
            Self::UnknownQuery => "unknown query",
            Self::ConnectionError => "connection error",
            Self::InternalError => "internal error",
            Self::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for StationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failed station fetch, published as data rather than propagated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind}{}", detail(.message))]
pub struct StationError {
    pub kind: StationErrorKind,
    pub message: Option<String>,
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl StationError {
    pub fn new(kind: StationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn bare(kind: StationErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

/// Published view of one station
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementSet {
    pub station_name: Option<String>,
    /// Newest sample, while it is still fresh enough to show as "now"
    pub current: Option<Sample>,
    /// Ascending by timestamp, no duplicate timestamps
    pub historical: Vec<Sample>,
    /// Outcome of the latest fetch only
    pub error: Option<StationError>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl MeasurementSet {
    /// Fresh state for a newly activated station
    pub fn reset(station_name: Option<String>) -> Self {
        Self {
            station_name,
            ..Default::default()
        }
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.historical.last().map(|s| s.timestamp)
    }
}
