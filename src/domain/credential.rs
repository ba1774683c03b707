use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected station settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CredentialError {
    #[error("station id and password must both be set, or all fields left empty")]
    InvalidConfiguration,

    #[error("display scale must be a positive finite number, got {0}")]
    InvalidScale(f32),
}

/// Login for a remote weather station.
///
/// Either every field is empty (station not configured) or both the station
/// id and the password are present. The display name is optional once the
/// station is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationCredential {
    display_name: String,
    station_id: String,
    #[serde(skip_serializing)]
    password: String,
}

impl StationCredential {
    pub fn new(
        display_name: impl Into<String>,
        station_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let display_name = display_name.into();
        let station_id = station_id.into();
        let password = password.into();

        let configured = !station_id.is_empty() && !password.is_empty();
        let unset = display_name.is_empty() && station_id.is_empty() && password.is_empty();
        if !configured && !unset {
            return Err(CredentialError::InvalidConfiguration);
        }

        Ok(Self {
            display_name,
            station_id,
            password,
        })
    }

    /// The "no station configured" value
    pub fn unset() -> Self {
        Self {
            display_name: String::new(),
            station_id: String::new(),
            password: String::new(),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.station_id.is_empty()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Default for StationCredential {
    fn default() -> Self {
        Self::unset()
    }
}

/// Everything the settings source publishes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSettings {
    pub credential: StationCredential,
    /// UI scale factor; carried along, never read by the engine
    pub display_scale: f32,
}

impl StationSettings {
    pub const DEFAULT_SCALE: f32 = 1.0;

    pub fn new(credential: StationCredential) -> Self {
        Self {
            credential,
            display_scale: Self::DEFAULT_SCALE,
        }
    }

    pub fn with_display_scale(mut self, display_scale: f32) -> Result<Self, CredentialError> {
        if !display_scale.is_finite() || display_scale <= 0.0 {
            return Err(CredentialError::InvalidScale(display_scale));
        }
        self.display_scale = display_scale;
        Ok(self)
    }
}

impl Default for StationSettings {
    fn default() -> Self {
        Self::new(StationCredential::unset())
    }
}

/// Raw settings as entered by a user or read from a file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsInput {
    pub display_name: String,
    pub station_id: String,
    pub station_password: String,
    pub display_scale: Option<f32>,
}

impl TryFrom<SettingsInput> for StationSettings {
    type Error = CredentialError;

    fn try_from(input: SettingsInput) -> Result<Self, Self::Error> {
        let credential =
            StationCredential::new(input.display_name, input.station_id, input.station_password)?;
        StationSettings::new(credential)
            .with_display_scale(input.display_scale.unwrap_or(StationSettings::DEFAULT_SCALE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_fully_configured_or_fully_empty() {
        assert!(StationCredential::new("Pier", "123", "secret").is_ok());
        assert!(StationCredential::new("", "123", "secret").is_ok());
        assert!(StationCredential::new("", "", "").unwrap().is_unset());
    }

    #[test]
    fn rejects_partial_credentials() {
        let partial = [
            ("Pier", "", ""),
            ("", "123", ""),
            ("", "", "secret"),
            ("Pier", "123", ""),
            ("Pier", "", "secret"),
        ];
        for (name, id, password) in partial {
            assert_eq!(
                StationCredential::new(name, id, password),
                Err(CredentialError::InvalidConfiguration),
                "{name:?} {id:?} {password:?}"
            );
        }
    }

    #[test]
    fn password_is_never_serialized() {
        let credential = StationCredential::new("Pier", "123", "secret").unwrap();
        let json = serde_json::to_string(&credential).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn settings_input_validates_scale() {
        let input = SettingsInput {
            display_scale: Some(0.0),
            ..Default::default()
        };
        assert_eq!(
            StationSettings::try_from(input),
            Err(CredentialError::InvalidScale(0.0))
        );

        let settings = StationSettings::try_from(SettingsInput::default()).unwrap();
        assert_eq!(settings.display_scale, 1.0);
        assert!(settings.credential.is_unset());
    }
}
