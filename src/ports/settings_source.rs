use tokio::sync::watch;

use crate::domain::StationSettings;

/// Port for observing station settings
pub trait SettingsSource: Send + Sync {
    /// Receiver that always holds the latest settings
    fn subscribe(&self) -> watch::Receiver<StationSettings>;
}
