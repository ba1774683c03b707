use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::adapters::InMemorySettings;
use crate::application::{PreciseTimeProvider, StationService};

use super::handlers::{
    health_handler, settings_handler, station_handler, time_handler, update_settings_handler,
    AppState,
};

pub fn create_router(
    station_service: Arc<StationService>,
    time_provider: Arc<PreciseTimeProvider>,
    settings: Arc<InMemorySettings>,
) -> Router {
    let state = AppState {
        station_service,
        time_provider,
        settings,
    };

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/station", get(station_handler))
        .route("/api/time", get(time_handler))
        .route(
            "/api/settings",
            get(settings_handler).put(update_settings_handler),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::application::testing::{FakeClock, FakeStationClient};
    use crate::application::{EngineConfig, TimeConfig};
    use crate::domain::{StationCredential, StationSettings};

    struct Fixture {
        router: Router,
        settings: Arc<InMemorySettings>,
    }

    fn fixture(initial: StationSettings) -> Fixture {
        let clock = FakeClock::new();
        let time = Arc::new(PreciseTimeProvider::new(TimeConfig::default(), clock));
        let service = Arc::new(StationService::new(
            EngineConfig::default(),
            Arc::clone(&time),
            FakeStationClient::new(),
        ));
        let settings = Arc::new(InMemorySettings::new(initial));
        Fixture {
            router: create_router(service, time, Arc::clone(&settings)),
            settings,
        }
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn put_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn health_reports_service() {
        let (status, body) = call(fixture(StationSettings::default()).router, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "marine-screen");
    }

    #[tokio::test(start_paused = true)]
    async fn station_starts_empty() {
        let (status, body) = call(fixture(StationSettings::default()).router, get_request("/api/station")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["historical"], serde_json::json!([]));
        assert!(body["current"].is_null());
        assert!(body["error"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn time_is_system_only_before_sync() {
        let (status, body) = call(fixture(StationSettings::default()).router, get_request("/api/time")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SYSTEM_ONLY");
        assert!(body["reference_time"].is_null());
        assert!(body["drift_ms"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn settings_never_expose_password() {
        let credential = StationCredential::new("Pier", "1234", "secret").unwrap();
        let (status, body) = call(
            fixture(StationSettings::new(credential)).router,
            get_request("/api/settings"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["station_id"], "1234");
        assert_eq!(body["password_set"], true);
        assert!(!body.to_string().contains("secret"));
    }

    #[tokio::test(start_paused = true)]
    async fn put_settings_publishes_valid_input() {
        let fixture = fixture(StationSettings::default());
        let mut rx = crate::ports::SettingsSource::subscribe(fixture.settings.as_ref());

        let (status, body) = call(
            fixture.router,
            put_json(
                "/api/settings",
                serde_json::json!({
                    "display_name": "Pier",
                    "station_id": "42",
                    "station_password": "pw"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["station_id"], "42");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().credential.station_id(), "42");
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_put_publishes_once() {
        let fixture = fixture(StationSettings::default());
        let mut rx = crate::ports::SettingsSource::subscribe(fixture.settings.as_ref());
        let body = serde_json::json!({ "station_id": "42", "station_password": "pw" });

        let (status, _) = call(fixture.router.clone(), put_json("/api/settings", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        let (status, response) = call(fixture.router, put_json("/api/settings", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["station_id"], "42");
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn put_settings_rejects_partial_credential() {
        let fixture = fixture(StationSettings::default());

        let (status, body) = call(
            fixture.router,
            put_json("/api/settings", serde_json::json!({ "station_id": "42" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
        assert!(fixture.settings.current().credential.is_unset());
    }
}
