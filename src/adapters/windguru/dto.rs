use chrono::DateTime;
use serde::Deserialize;

use crate::domain::{Sample, StationError, StationErrorKind};

/// Variables requested from the station data API, in response key order
pub const VARIABLES: [&str; 6] = [
    "unixtime",
    "wind_avg",
    "wind_max",
    "wind_direction",
    "temperature",
    "rh",
];

/// Station data or error body. Every key is optional; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StationDataResponse {
    pub error_message: Option<String>,
    pub unixtime: Option<Vec<i64>>,
    pub wind_avg: Option<Vec<Option<f64>>>,
    pub wind_max: Option<Vec<Option<f64>>>,
    pub wind_direction: Option<Vec<Option<f64>>>,
    pub temperature: Option<Vec<Option<f64>>>,
    pub rh: Option<Vec<Option<f64>>>,
}

/// Parse a response body. The API answers `[]` where it means `{}`.
pub fn parse_body(body: &str) -> Result<StationDataResponse, StationError> {
    let body = if body.trim() == "[]" { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| {
        StationError::new(
            StationErrorKind::InternalError,
            format!("malformed station response: {e}"),
        )
    })
}

/// Map an API error message onto an error kind
pub fn classify(message: Option<&str>) -> StationError {
    let Some(message) = message.filter(|m| !m.is_empty()) else {
        return StationError::bare(StationErrorKind::Unknown);
    };

    let lower = message.to_lowercase();
    let kind = if lower.contains("wrong station login") {
        StationErrorKind::WrongStationLogin
    } else if lower.contains("unknown station") {
        StationErrorKind::UnknownStation
    } else if lower.contains("unknown query") {
        StationErrorKind::UnknownQuery
    } else {
        StationErrorKind::Unknown
    };
    StationError::new(kind, message)
}

fn value_at(values: &Option<Vec<Option<f64>>>, index: usize) -> Option<f64> {
    values.as_ref().and_then(|v| v.get(index).copied().flatten())
}

impl StationDataResponse {
    pub fn error(&self) -> Option<StationError> {
        self.error_message.as_deref().map(|m| classify(Some(m)))
    }

    /// Zip the parallel arrays into samples, ascending and unique by timestamp
    pub fn into_samples(self) -> Vec<Sample> {
        let Some(timestamps) = &self.unixtime else {
            return Vec::new();
        };

        let mut samples: Vec<Sample> = timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &seconds)| {
                let timestamp = DateTime::from_timestamp(seconds, 0)?;
                Some(Sample {
                    timestamp,
                    wind_speed_kts: value_at(&self.wind_avg, i),
                    wind_gust_kts: value_at(&self.wind_max, i),
                    wind_direction_deg: value_at(&self.wind_direction, i).map(|d| d.round() as i32),
                    temperature_c: value_at(&self.temperature, i),
                    humidity_percent: value_at(&self.rh, i).map(|h| h.round() as i32),
                })
            })
            .collect();

        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
        samples
    }
}
