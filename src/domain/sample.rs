use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MPS_PER_KNOT: f64 = 0.514444;

/// A single station observation.
///
/// Only raw readings are stored; metric and imperial conversions are
/// computed on every access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub wind_speed_kts: Option<f64>,
    pub wind_gust_kts: Option<f64>,
    pub wind_direction_deg: Option<i32>,
    pub temperature_c: Option<f64>,
    pub humidity_percent: Option<i32>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            wind_speed_kts: None,
            wind_gust_kts: None,
            wind_direction_deg: None,
            temperature_c: None,
            humidity_percent: None,
        }
    }

    pub fn with_wind(mut self, speed_kts: f64, gust_kts: f64, direction_deg: i32) -> Self {
        self.wind_speed_kts = Some(speed_kts);
        self.wind_gust_kts = Some(gust_kts);
        self.wind_direction_deg = Some(direction_deg);
        self
    }

    pub fn with_air(mut self, temperature_c: f64, humidity_percent: i32) -> Self {
        self.temperature_c = Some(temperature_c);
        self.humidity_percent = Some(humidity_percent);
        self
    }

    pub fn wind_speed_mps(&self) -> Option<f64> {
        self.wind_speed_kts.map(|kts| kts * MPS_PER_KNOT)
    }

    pub fn wind_gust_mps(&self) -> Option<f64> {
        self.wind_gust_kts.map(|kts| kts * MPS_PER_KNOT)
    }

    pub fn temperature_f(&self) -> Option<f64> {
        self.temperature_c.map(|c| c * 9.0 / 5.0 + 32.0)
    }
}
