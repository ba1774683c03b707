use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::ntp::DEFAULT_SERVERS;
use crate::adapters::windguru::DEFAULT_ENDPOINT;
use crate::application::{EngineConfig, TimeConfig};
use crate::domain::{CredentialError, SettingsInput, StationSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid station settings in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: CredentialError,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    /// TOML file with the initial station settings
    pub settings_path: Option<PathBuf>,
    pub station_endpoint: String,
    pub station_timeout: Duration,
    pub ntp_servers: Vec<String>,
    pub ntp_timeout: Duration,
    pub engine: EngineConfig,
    pub time: TimeConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; unset or unparsable values use defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let secs = |key: &str, default: Duration| parsed(key).map(Duration::from_secs).unwrap_or(default);
        let millis = |key: &str, default: Duration| parsed(key).map(Duration::from_millis).unwrap_or(default);
        let minutes = |key: &str, default: Duration| {
            parsed(key)
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(default)
        };

        let engine_defaults = EngineConfig::default();
        let time_defaults = TimeConfig::default();

        Self {
            port: parse_or(lookup("MARINE_SCREEN_PORT"), 3000),
            log_level: lookup("MARINE_SCREEN_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            settings_path: lookup("MARINE_SCREEN_SETTINGS_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            station_endpoint: lookup("MARINE_SCREEN_STATION_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            station_timeout: secs("MARINE_SCREEN_STATION_TIMEOUT_SECS", Duration::from_secs(5)),
            ntp_servers: lookup("MARINE_SCREEN_NTP_SERVERS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|| DEFAULT_SERVERS.iter().map(|s| s.to_string()).collect()),
            ntp_timeout: secs("MARINE_SCREEN_NTP_TIMEOUT_SECS", Duration::from_secs(5)),
            engine: EngineConfig {
                retention_window: minutes(
                    "MARINE_SCREEN_RETENTION_MINUTES",
                    engine_defaults.retention_window,
                ),
                refresh_interval: secs("MARINE_SCREEN_REFRESH_SECS", engine_defaults.refresh_interval),
                current_max_age: secs(
                    "MARINE_SCREEN_CURRENT_MAX_AGE_SECS",
                    engine_defaults.current_max_age,
                ),
                sweep_interval: millis("MARINE_SCREEN_SWEEP_MS", engine_defaults.sweep_interval),
                interval_minutes: parse_or(
                    lookup("MARINE_SCREEN_AVG_MINUTES"),
                    engine_defaults.interval_minutes,
                ),
            },
            time: TimeConfig {
                refresh_interval: secs("MARINE_SCREEN_NTP_REFRESH_SECS", time_defaults.refresh_interval),
                retry_initial_delay: secs(
                    "MARINE_SCREEN_NTP_RETRY_INITIAL_SECS",
                    time_defaults.retry_initial_delay,
                ),
                retry_max_delay: secs("MARINE_SCREEN_NTP_RETRY_MAX_SECS", time_defaults.retry_max_delay),
                stale_threshold: secs("MARINE_SCREEN_NTP_STALE_SECS", time_defaults.stale_threshold),
                drift_warning_threshold: secs(
                    "MARINE_SCREEN_DRIFT_WARNING_SECS",
                    time_defaults.drift_warning_threshold,
                ),
                publish_interval: millis(
                    "MARINE_SCREEN_TIME_PUBLISH_MS",
                    time_defaults.publish_interval,
                ),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    station: SettingsInput,
}

/// Load the initial station settings from a TOML file:
///
/// ```toml
/// [station]
/// display_name = "Harbour pier"
/// station_id = "1234"
/// station_password = "secret"
/// display_scale = 1.0
/// ```
pub fn load_settings(path: &Path) -> Result<StationSettings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: SettingsFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    StationSettings::try_from(file.station).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}
