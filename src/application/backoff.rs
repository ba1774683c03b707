use std::time::Duration;

use rand::Rng;

const JITTER: f64 = 0.15;

/// Exponential retry delay: starts at `initial`, doubles after every
/// failure, jittered by ±15% and never above `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            max,
            next: initial,
        }
    }

    /// Delay to wait after the latest failure
    pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        let factor = rng.gen_range(1.0 - JITTER..=1.0 + JITTER);
        let delay = self.next.mul_f64(factor).min(self.max);
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}
