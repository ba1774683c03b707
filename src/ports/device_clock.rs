use chrono::{DateTime, Utc};

/// Port for the raw device wall clock
pub trait DeviceClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
