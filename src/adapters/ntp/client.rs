use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;
use tracing::debug;

use super::packet::{self, PACKET_LEN};
use crate::ports::{ClockError, ClockSource};

pub const DEFAULT_SERVERS: [&str; 2] = ["time.google.com:123", "time.windows.com:123"];

/// SNTP client querying a list of servers in order
#[derive(Debug, Clone)]
pub struct NtpClient {
    servers: Vec<String>,
    timeout: Duration,
}

impl NtpClient {
    pub fn new(servers: Vec<String>, timeout: Duration) -> Self {
        Self { servers, timeout }
    }

    async fn query_server(&self, server: &str) -> Result<DateTime<Utc>, ClockError> {
        let io_error = |source: std::io::Error| ClockError::Io {
            server: server.to_string(),
            source,
        };

        let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(io_error)?;
        socket.connect(server).await.map_err(io_error)?;
        socket.send(&packet::client_request()).await.map_err(io_error)?;

        let mut reply = [0u8; PACKET_LEN * 2];
        let len = tokio::time::timeout(self.timeout, socket.recv(&mut reply))
            .await
            .map_err(|_| ClockError::Timeout(server.to_string()))?
            .map_err(io_error)?;

        packet::parse_reply(&reply[..len]).map_err(|reason| ClockError::InvalidResponse {
            server: server.to_string(),
            reason,
        })
    }
}

#[async_trait]
impl ClockSource for NtpClient {
    async fn query(&self) -> Result<DateTime<Utc>, ClockError> {
        let mut last_error = ClockError::NoServers;
        for server in &self.servers {
            match self.query_server(server).await {
                Ok(time) => return Ok(time),
                Err(e) => {
                    debug!(server = %server, error = %e, "NTP query failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}
