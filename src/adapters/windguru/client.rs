use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::StatusCode;
use tracing::debug;

use super::dto::{self, VARIABLES};
use crate::domain::{Sample, StationError, StationErrorKind};
use crate::ports::{FetchRequest, StationClient};

pub const DEFAULT_ENDPOINT: &str = "https://www.windguru.cz/int/wgsapi.php";

/// WindGuru station data API client
pub struct WindGuruClient {
    http: reqwest::Client,
    endpoint: String,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl WindGuruClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_base_delay = base_delay;
        self
    }

    async fn send(&self, request: &FetchRequest) -> Result<(StatusCode, String), reqwest::Error> {
        let from = request.from.to_rfc3339_opts(SecondsFormat::Secs, true);
        let to = request.to.to_rfc3339_opts(SecondsFormat::Secs, true);
        let avg_minutes = request.interval_minutes.to_string();
        let vars = VARIABLES.join(",");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("uid", request.station_id.as_str()),
                ("password", request.password.as_str()),
                ("q", "station_data"),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("avg_minutes", avg_minutes.as_str()),
                ("vars", vars.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Send with retries on transport errors and 5xx answers
    async fn send_with_retry(&self, request: &FetchRequest) -> Result<(StatusCode, String), StationError> {
        let mut attempt = 1;
        loop {
            match self.send(request).await {
                Ok((status, body)) if !status.is_server_error() || attempt >= self.max_attempts => {
                    return Ok((status, body));
                }
                Ok((status, _)) => {
                    debug!(uid = %request.station_id, attempt, %status, "Station API server error, retrying");
                }
                Err(e) if attempt >= self.max_attempts => return Err(transport_error(e)),
                Err(e) => {
                    debug!(uid = %request.station_id, attempt, error = %e, "Station API request failed, retrying");
                }
            }

            tokio::time::sleep(self.retry_base_delay * 2u32.pow(attempt - 1)).await;
            attempt += 1;
        }
    }
}

fn transport_error(e: reqwest::Error) -> StationError {
    let kind = if e.is_decode() {
        StationErrorKind::InternalError
    } else {
        StationErrorKind::ConnectionError
    };
    StationError::new(kind, e.to_string())
}

/// Turn a final HTTP answer into samples or a classified error
fn interpret(status: StatusCode, body: &str) -> Result<Vec<Sample>, StationError> {
    let parsed = dto::parse_body(body)?;
    if let Some(error) = parsed.error() {
        return Err(error);
    }
    if !status.is_success() {
        return Err(StationError::new(StationErrorKind::Unknown, format!("HTTP {status}")));
    }
    Ok(parsed.into_samples())
}

#[async_trait]
impl StationClient for WindGuruClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Sample>, StationError> {
        debug!(
            uid = %request.station_id,
            from = %request.from,
            to = %request.to,
            interval = request.interval_minutes,
            "Fetching station data"
        );

        let (status, body) = self.send_with_retry(request).await?;
        let result = interpret(status, &body);

        match &result {
            Ok(samples) => debug!(uid = %request.station_id, samples = samples.len(), "Station data parsed"),
            Err(e) => debug!(uid = %request.station_id, kind = %e.kind, "Station API returned an error"),
        }
        result
    }
}
