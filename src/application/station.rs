use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::merge::{is_current, merge_samples, select_current};
use super::{to_time_delta, Generation, MeasurementCell, PreciseTimeProvider};
use crate::domain::{
    MeasurementSet, Sample, StationCredential, StationError, StationErrorKind, StationSettings,
};
use crate::ports::{FetchRequest, StationClient};

/// Tuning for [`StationService`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How far back samples are retained
    pub retention_window: Duration,
    pub refresh_interval: Duration,
    /// Maximum age of the sample shown as current
    pub current_max_age: Duration,
    pub sweep_interval: Duration,
    /// Averaging interval requested from the station
    pub interval_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_window: Duration::from_secs(4 * 60 * 60),
            refresh_interval: Duration::from_secs(60),
            current_max_age: Duration::from_secs(3 * 60),
            sweep_interval: Duration::from_secs(1),
            interval_minutes: 1,
        }
    }
}

/// One credential's run of the refresh and sweep loops
struct Activation {
    generation: Generation,
    credential: StationCredential,
}

impl Activation {
    fn station_name(&self) -> Option<String> {
        station_name(&self.credential)
    }
}

fn station_name(credential: &StationCredential) -> Option<String> {
    let name = credential.display_name();
    (!name.is_empty()).then(|| name.to_string())
}

/// Keeps a bounded, continuously refreshed view of one weather station.
///
/// Per active credential two tasks run side by side: the refresh loop
/// fetches and merges new samples, the sweep loop drops a `current` sample
/// that has aged out between refreshes. Both write through the same
/// [`MeasurementCell`].
pub struct StationService {
    config: EngineConfig,
    time: Arc<PreciseTimeProvider>,
    client: Arc<dyn StationClient>,
    cell: MeasurementCell,
}

impl StationService {
    pub fn new(
        config: EngineConfig,
        time: Arc<PreciseTimeProvider>,
        client: Arc<dyn StationClient>,
    ) -> Self {
        Self {
            config,
            time,
            client,
            cell: MeasurementCell::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MeasurementSet> {
        self.cell.subscribe()
    }

    pub fn current(&self) -> MeasurementSet {
        self.cell.get()
    }

    /// Follow the settings source, restarting the loops whenever the
    /// credential changes. Other settings fields do not affect the engine.
    ///
    /// Returns when the settings source is closed.
    pub async fn run(self: Arc<Self>, mut settings: watch::Receiver<StationSettings>) {
        let mut tasks = JoinSet::new();
        let mut active: Option<StationCredential> = None;

        loop {
            let credential = settings.borrow_and_update().credential.clone();

            if active.as_ref() == Some(&credential) {
                debug!("Settings changed without a new credential, keeping station loops");
            } else {
                tasks.shutdown().await;
                let activation = self.activate(credential.clone());
                active = Some(credential);

                let service = Arc::clone(&self);
                tasks.spawn(service.refresh_loop(Arc::clone(&activation)));
                let service = Arc::clone(&self);
                tasks.spawn(service.sweep_loop(activation));
            }

            if settings.changed().await.is_err() {
                info!("Settings source closed, stopping station loops");
                break;
            }
        }

        tasks.shutdown().await;
    }

    fn activate(&self, credential: StationCredential) -> Arc<Activation> {
        let generation = self.cell.activate(MeasurementSet::reset(station_name(&credential)));
        info!(
            generation,
            station = credential.station_id(),
            "Activating station"
        );
        Arc::new(Activation {
            generation,
            credential,
        })
    }

    async fn refresh_loop(self: Arc<Self>, activation: Arc<Activation>) {
        self.time.wait_first_sync().await;
        debug!(generation = activation.generation, "Starting refresh loop");

        loop {
            self.refresh_once(&activation).await;
            tokio::time::sleep(self.config.refresh_interval).await;
        }
    }

    async fn sweep_loop(self: Arc<Self>, activation: Arc<Activation>) {
        self.time.wait_first_sync().await;
        debug!(generation = activation.generation, "Starting sweep loop");

        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sweep(&activation);
        }
    }

    async fn refresh_once(&self, activation: &Activation) {
        let now = self.time.current().time();
        let window_start = now - to_time_delta(self.config.retention_window);
        let fetch_from = self
            .cell
            .read(|state| state.latest_timestamp())
            .map_or(window_start, |latest| latest.max(window_start));

        let result = if activation.credential.is_unset() {
            Ok(Vec::new())
        } else {
            let request = FetchRequest {
                station_id: activation.credential.station_id().to_string(),
                password: activation.credential.password().to_string(),
                from: fetch_from,
                to: now,
                interval_minutes: self.config.interval_minutes,
            };
            self.fetch(&request).await
        };

        let (fetched, error) = match result {
            Ok(samples) => {
                debug!(
                    generation = activation.generation,
                    fetched = samples.len(),
                    "Station fetch done"
                );
                (samples, None)
            }
            Err(e) => {
                warn!(generation = activation.generation, error = %e, "Station fetch failed");
                (Vec::new(), Some(e))
            }
        };

        // The fetch may have taken a while; judge currency at publish time.
        let published_at = self.time.current().time();
        let max_age = to_time_delta(self.config.current_max_age);
        let applied = self.cell.update(activation.generation, |state| {
            let historical = merge_samples(&state.historical, &fetched, window_start, now);
            let current = select_current(&historical, published_at, max_age);
            let last_updated_at = match error {
                None => Some(now),
                Some(_) => state.last_updated_at,
            };
            debug!(
                generation = activation.generation,
                retained = historical.len(),
                "Publishing measurements"
            );
            *state = MeasurementSet {
                station_name: activation.station_name(),
                current,
                historical,
                error,
                last_updated_at,
            };
            true
        });

        if !applied {
            debug!(
                generation = activation.generation,
                "Discarding result of a superseded activation"
            );
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Sample>, StationError> {
        match AssertUnwindSafe(self.client.fetch(request)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(StationError::new(
                StationErrorKind::InternalError,
                "station client panicked",
            )),
        }
    }

    fn sweep(&self, activation: &Activation) {
        let now = self.time.current().time();
        let max_age = to_time_delta(self.config.current_max_age);

        self.cell.update(activation.generation, |state| match &state.current {
            Some(sample) if !is_current(sample, now, max_age) => {
                debug!(timestamp = %sample.timestamp, %now, "Current sample expired");
                state.current = None;
                true
            }
            _ => false,
        });
    }
}
