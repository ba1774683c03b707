use tokio::sync::watch;
use tracing::info;

use crate::domain::StationSettings;
use crate::ports::SettingsSource;

/// Observable in-memory settings store
pub struct InMemorySettings {
    settings: watch::Sender<StationSettings>,
}

impl InMemorySettings {
    pub fn new(initial: StationSettings) -> Self {
        let (settings, _) = watch::channel(initial);
        Self { settings }
    }

    pub fn current(&self) -> StationSettings {
        self.settings.borrow().clone()
    }

    /// Publish new settings. Returns `false` if nothing changed.
    pub fn update(&self, settings: StationSettings) -> bool {
        let changed = self.settings.send_if_modified(|current| {
            if *current == settings {
                return false;
            }
            *current = settings;
            true
        });
        if changed {
            info!(
                station = self.settings.borrow().credential.station_id(),
                "Station settings updated"
            );
        }
        changed
    }
}

impl Default for InMemorySettings {
    fn default() -> Self {
        Self::new(StationSettings::default())
    }
}

impl SettingsSource for InMemorySettings {
    fn subscribe(&self) -> watch::Receiver<StationSettings> {
        self.settings.subscribe()
    }
}
