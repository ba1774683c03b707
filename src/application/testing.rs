//! Fakes shared by the application tests. Everything runs on tokio's paused clock.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::domain::{Sample, StationError};
use crate::ports::{ClockError, ClockSource, DeviceClock, FetchRequest, StationClient};

/// Wall clock driven by tokio's (paused) monotonic clock
pub(crate) struct FakeClock {
    base: DateTime<Utc>,
    started: Instant,
    skew: Mutex<TimeDelta>,
}

impl FakeClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            base: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            started: Instant::now(),
            skew: Mutex::new(TimeDelta::zero()),
        })
    }

    /// What a perfect time server would say
    pub(crate) fn true_now(&self) -> DateTime<Utc> {
        self.base + TimeDelta::from_std(self.started.elapsed()).unwrap()
    }

    pub(crate) fn set_skew(&self, skew: TimeDelta) {
        *self.skew.lock() = skew;
    }
}

impl DeviceClock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.true_now() + *self.skew.lock()
    }
}

/// Time server that always answers with the true time
pub(crate) struct FakeTimeServer {
    clock: Arc<FakeClock>,
}

impl FakeTimeServer {
    pub(crate) fn new(clock: Arc<FakeClock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ClockSource for FakeTimeServer {
    async fn query(&self) -> Result<DateTime<Utc>, ClockError> {
        Ok(self.clock.true_now())
    }
}

/// Time server following a fixed success/failure script, then failing forever
pub(crate) struct FlakyTimeServer {
    clock: Arc<FakeClock>,
    script: Mutex<VecDeque<bool>>,
    attempts: Mutex<Vec<Instant>>,
    notify: Notify,
}

impl FlakyTimeServer {
    pub(crate) fn new(clock: Arc<FakeClock>, script: Vec<bool>) -> Self {
        Self {
            clock,
            script: Mutex::new(script.into()),
            attempts: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    pub(crate) async fn wait_for_attempts(&self, count: usize) -> Vec<Instant> {
        loop {
            let notified = self.notify.notified();
            {
                let attempts = self.attempts.lock();
                if attempts.len() >= count {
                    return attempts[..count].to_vec();
                }
            }
            notified.await;
        }
    }
}

#[async_trait]
impl ClockSource for FlakyTimeServer {
    async fn query(&self) -> Result<DateTime<Utc>, ClockError> {
        self.attempts.lock().push(Instant::now());
        self.notify.notify_waiters();
        let succeed = self.script.lock().pop_front().unwrap_or(false);
        if succeed {
            Ok(self.clock.true_now())
        } else {
            Err(ClockError::Timeout("fake".to_string()))
        }
    }
}

type Responder = Box<dyn Fn(&FetchRequest) -> Result<Vec<Sample>, StationError> + Send + Sync>;

struct Behaviour {
    delay: Duration,
    respond: Responder,
}

/// Station client with per-station scripted answers
#[derive(Default)]
pub(crate) struct FakeStationClient {
    behaviours: Mutex<HashMap<String, Arc<Behaviour>>>,
    requests: Mutex<Vec<FetchRequest>>,
    notify: Notify,
}

impl FakeStationClient {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond<F>(&self, station_id: &str, delay: Duration, respond: F)
    where
        F: Fn(&FetchRequest) -> Result<Vec<Sample>, StationError> + Send + Sync + 'static,
    {
        self.behaviours.lock().insert(
            station_id.to_string(),
            Arc::new(Behaviour {
                delay,
                respond: Box::new(respond),
            }),
        );
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    pub(crate) async fn wait_for_requests(&self, count: usize) -> Vec<FetchRequest> {
        loop {
            let notified = self.notify.notified();
            {
                let requests = self.requests.lock();
                if requests.len() >= count {
                    return requests.clone();
                }
            }
            notified.await;
        }
    }
}

#[async_trait]
impl StationClient for FakeStationClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Sample>, StationError> {
        self.requests.lock().push(request.clone());
        self.notify.notify_waiters();

        let behaviour = self.behaviours.lock().get(&request.station_id).cloned();
        let Some(behaviour) = behaviour else {
            return Ok(Vec::new());
        };
        if !behaviour.delay.is_zero() {
            tokio::time::sleep(behaviour.delay).await;
        }
        (behaviour.respond)(request)
    }
}

/// Sample `minutes_ago` before `now` with a recognizable wind speed
pub(crate) fn sample_at(now: DateTime<Utc>, minutes_ago: i64, wind_kts: f64) -> Sample {
    Sample::new(now - TimeDelta::minutes(minutes_ago)).with_wind(wind_kts, wind_kts + 5.0, 180)
}
