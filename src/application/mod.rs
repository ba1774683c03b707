pub mod backoff;
pub mod measurement_cell;
pub mod merge;
pub mod station;
pub mod time_provider;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use chrono::TimeDelta;

pub use backoff::Backoff;
pub use measurement_cell::{Generation, MeasurementCell};
pub use merge::{merge_samples, select_current};
pub use station::{EngineConfig, StationService};
pub use time_provider::{PreciseTimeProvider, TimeConfig};

/// Convert a configured duration for wall-clock arithmetic, saturating at a century
pub(crate) fn to_time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or_else(|_| TimeDelta::days(36_500))
}
