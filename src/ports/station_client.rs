use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Sample, StationError};

/// Parameters of one station data request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub station_id: String,
    pub password: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub interval_minutes: u32,
}

/// Port for fetching time-series samples from a remote station
#[async_trait]
pub trait StationClient: Send + Sync {
    /// Samples in `[from, to]`, ascending by timestamp.
    ///
    /// Any retrying is done here; callers treat an error as final.
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Sample>, StationError>;
}
