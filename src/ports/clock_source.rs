use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure to obtain externally synchronized time
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("I/O error talking to {server}: {source}")]
    Io {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("invalid response from {server}: {reason}")]
    InvalidResponse { server: String, reason: &'static str },

    #[error("no time servers configured")]
    NoServers,
}

/// Port for querying an external time reference (e.g. NTP)
#[async_trait]
pub trait ClockSource: Send + Sync {
    /// Fetch the current absolute time. Slow and fallible.
    async fn query(&self) -> Result<DateTime<Utc>, ClockError>;
}
