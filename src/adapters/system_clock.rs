use chrono::{DateTime, Utc};

use crate::ports::DeviceClock;

/// Device wall clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDeviceClock;

impl DeviceClock for SystemDeviceClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
