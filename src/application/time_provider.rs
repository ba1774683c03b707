use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{to_time_delta, Backoff};
use crate::domain::{TimeSnapshot, TimeStatus};
use crate::ports::{ClockSource, DeviceClock};

/// Tuning for [`PreciseTimeProvider`]
#[derive(Debug, Clone)]
pub struct TimeConfig {
    /// Wait after a successful sync
    pub refresh_interval: Duration,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
    /// Anchor age after which the time is reported as stale
    pub stale_threshold: Duration,
    /// Device clock deviation that triggers a drift warning
    pub drift_warning_threshold: Duration,
    /// How often the snapshot cell is republished between syncs
    pub publish_interval: Duration,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(2 * 60),
            retry_initial_delay: Duration::from_secs(10),
            retry_max_delay: Duration::from_secs(60),
            stale_threshold: Duration::from_secs(5 * 60),
            drift_warning_threshold: Duration::from_secs(5 * 60),
            publish_interval: Duration::from_secs(1),
        }
    }
}

/// Reference time paired with the monotonic tick it was received at
#[derive(Debug, Clone, Copy)]
struct Anchor {
    reference: DateTime<Utc>,
    tick: Instant,
}

/// Best-effort absolute time.
///
/// A background task keeps an anchor fresh against a [`ClockSource`];
/// [`current`](Self::current) extrapolates from that anchor with the
/// monotonic clock and never does I/O.
pub struct PreciseTimeProvider {
    config: TimeConfig,
    device_clock: Arc<dyn DeviceClock>,
    anchor: RwLock<Option<Anchor>>,
    first_sync: watch::Sender<bool>,
    snapshots: watch::Sender<TimeSnapshot>,
}

impl PreciseTimeProvider {
    pub fn new(config: TimeConfig, device_clock: Arc<dyn DeviceClock>) -> Self {
        let (first_sync, _) = watch::channel(false);
        let (snapshots, _) = watch::channel(TimeSnapshot::system_only(device_clock.now()));
        Self {
            config,
            device_clock,
            anchor: RwLock::new(None),
            first_sync,
            snapshots,
        }
    }

    /// Start the sync loop. It runs until the returned handle is aborted.
    pub fn spawn(self: &Arc<Self>, source: Arc<dyn ClockSource>) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move { provider.run(source).await })
    }

    pub fn current(&self) -> TimeSnapshot {
        let anchor = *self.anchor.read();
        let local_time = self.device_clock.now();
        let Some(anchor) = anchor else {
            return TimeSnapshot::system_only(local_time);
        };

        let elapsed = anchor.tick.elapsed();
        let reference_time = anchor.reference + to_time_delta(elapsed);
        let drift = local_time - reference_time;

        let status = if elapsed > self.config.stale_threshold {
            TimeStatus::Stale
        } else if drift.abs() > to_time_delta(self.config.drift_warning_threshold) {
            TimeStatus::DriftWarning
        } else {
            TimeStatus::Ok
        };

        TimeSnapshot {
            status,
            reference_time: Some(reference_time),
            local_time,
            time_since_sync: Some(elapsed),
            drift: Some(drift),
        }
    }

    /// Gate that flips to `true` once, on the first successful sync
    pub fn first_sync(&self) -> watch::Receiver<bool> {
        self.first_sync.subscribe()
    }

    pub async fn wait_first_sync(&self) {
        let mut synced = self.first_sync.subscribe();
        // The sender lives as long as `self`, so this only returns once synced.
        let _ = synced.wait_for(|done| *done).await;
    }

    /// Snapshot republished after every sync attempt and on every publish tick
    pub fn subscribe(&self) -> watch::Receiver<TimeSnapshot> {
        self.snapshots.subscribe()
    }

    async fn run(&self, source: Arc<dyn ClockSource>) {
        info!("Starting time sync loop");
        let mut backoff = Backoff::new(self.config.retry_initial_delay, self.config.retry_max_delay);
        let mut rng = StdRng::from_entropy();

        loop {
            let delay = match source.query().await {
                Ok(reference) => {
                    self.record_sync(reference);
                    backoff.reset();
                    debug!(%reference, next_in = ?self.config.refresh_interval, "Time sync ok");
                    self.config.refresh_interval
                }
                Err(e) => {
                    let delay = backoff.next_delay(&mut rng);
                    warn!(error = %e, retry_in = ?delay, "Time sync failed");
                    delay
                }
            };

            self.publish();
            self.wait(delay).await;
        }
    }

    /// Sleep until the next sync attempt, keeping the snapshot cell current
    async fn wait(&self, delay: Duration) {
        let deadline = tokio::time::sleep(delay);
        tokio::pin!(deadline);

        let period = self.config.publish_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut deadline => return,
                _ = ticker.tick() => self.publish(),
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.current());
    }

    pub(crate) fn record_sync(&self, reference: DateTime<Utc>) {
        *self.anchor.write() = Some(Anchor {
            reference,
            tick: Instant::now(),
        });

        let first = self.first_sync.send_if_modified(|done| !std::mem::replace(done, true));
        if first {
            info!(%reference, "First time sync completed");
        }
    }
}
