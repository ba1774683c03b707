use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::adapters::InMemorySettings;
use crate::application::{PreciseTimeProvider, StationService};
use crate::domain::{
    CredentialError, MeasurementSet, Sample, SettingsInput, StationError, StationSettings,
    TimeSnapshot, TimeStatus,
};

/// Error answered as `{ "error": message }`
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        AppError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: err.to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub station_service: Arc<StationService>,
    pub time_provider: Arc<PreciseTimeProvider>,
    pub settings: Arc<InMemorySettings>,
}

/// One sample with its derived units
#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub timestamp: String,
    pub wind_speed_kts: Option<f64>,
    pub wind_speed_mps: Option<f64>,
    pub wind_gust_kts: Option<f64>,
    pub wind_gust_mps: Option<f64>,
    pub wind_direction_deg: Option<i32>,
    pub temperature_c: Option<f64>,
    pub temperature_f: Option<f64>,
    pub humidity_percent: Option<i32>,
}

impl From<&Sample> for SampleResponse {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp.to_rfc3339(),
            wind_speed_kts: sample.wind_speed_kts,
            wind_speed_mps: sample.wind_speed_mps(),
            wind_gust_kts: sample.wind_gust_kts,
            wind_gust_mps: sample.wind_gust_mps(),
            wind_direction_deg: sample.wind_direction_deg,
            temperature_c: sample.temperature_c,
            temperature_f: sample.temperature_f(),
            humidity_percent: sample.humidity_percent,
        }
    }
}

/// Response for /api/station
#[derive(Debug, Serialize)]
pub struct StationResponse {
    pub station_name: Option<String>,
    pub current: Option<SampleResponse>,
    pub historical: Vec<SampleResponse>,
    pub error: Option<StationError>,
    pub last_updated_at: Option<String>,
}

impl From<&MeasurementSet> for StationResponse {
    fn from(set: &MeasurementSet) -> Self {
        Self {
            station_name: set.station_name.clone(),
            current: set.current.as_ref().map(SampleResponse::from),
            historical: set.historical.iter().map(SampleResponse::from).collect(),
            error: set.error.clone(),
            last_updated_at: set.last_updated_at.as_ref().map(DateTime::to_rfc3339),
        }
    }
}

/// Response for /api/time
#[derive(Debug, Serialize)]
pub struct TimeResponse {
    pub status: TimeStatus,
    pub time: String,
    pub reference_time: Option<String>,
    pub local_time: String,
    pub ms_since_sync: Option<u128>,
    pub drift_ms: Option<i64>,
}

impl From<&TimeSnapshot> for TimeResponse {
    fn from(snapshot: &TimeSnapshot) -> Self {
        Self {
            status: snapshot.status,
            time: snapshot.time().to_rfc3339(),
            reference_time: snapshot.reference_time.as_ref().map(DateTime::<Utc>::to_rfc3339),
            local_time: snapshot.local_time.to_rfc3339(),
            ms_since_sync: snapshot.time_since_sync.map(|d| d.as_millis()),
            drift_ms: snapshot.drift.map(|d| d.num_milliseconds()),
        }
    }
}

/// Response for /api/settings; the password itself is never returned
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub display_name: String,
    pub station_id: String,
    pub password_set: bool,
    pub display_scale: f32,
}

impl From<&StationSettings> for SettingsResponse {
    fn from(settings: &StationSettings) -> Self {
        Self {
            display_name: settings.credential.display_name().to_string(),
            station_id: settings.credential.station_id().to_string(),
            password_set: !settings.credential.password().is_empty(),
            display_scale: settings.display_scale,
        }
    }
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "marine-screen"
        })),
    )
}

/// Handler for GET /api/station
pub async fn station_handler(State(state): State<AppState>) -> Json<StationResponse> {
    let set = state.station_service.current();
    Json(StationResponse::from(&set))
}

/// Handler for GET /api/time
pub async fn time_handler(State(state): State<AppState>) -> Json<TimeResponse> {
    Json(TimeResponse::from(&state.time_provider.current()))
}

/// Handler for GET /api/settings
pub async fn settings_handler(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse::from(&state.settings.current()))
}

/// Handler for PUT /api/settings
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Json(input): Json<SettingsInput>,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = StationSettings::try_from(input)?;
    let response = SettingsResponse::from(&settings);
    state.settings.update(settings);
    Ok(Json(response))
}
