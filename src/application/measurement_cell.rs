use parking_lot::Mutex;
use tokio::sync::watch;

use crate::domain::MeasurementSet;

/// Identifies one activation of the refresh loops
pub type Generation = u64;

/// Observable [`MeasurementSet`] guarded by a single lock.
///
/// Every write carries the generation of the activation that produced it;
/// once a newer generation has been started, older writes are dropped.
pub struct MeasurementCell {
    generation: Mutex<Generation>,
    state: watch::Sender<MeasurementSet>,
}

impl MeasurementCell {
    pub fn new() -> Self {
        let (state, _) = watch::channel(MeasurementSet::default());
        Self {
            generation: Mutex::new(0),
            state,
        }
    }

    /// Start a new generation and publish its initial state
    pub fn activate(&self, initial: MeasurementSet) -> Generation {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.state.send_replace(initial);
        *generation
    }

    /// Apply `update` if `generation` is still the active one.
    ///
    /// `update` returns whether it changed the state; subscribers are only
    /// notified in that case. Returns `false` for a stale generation.
    pub fn update<F>(&self, generation: Generation, update: F) -> bool
    where
        F: FnOnce(&mut MeasurementSet) -> bool,
    {
        let active = self.generation.lock();
        if *active != generation {
            return false;
        }
        self.state.send_if_modified(update);
        true
    }

    /// Inspect the published state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&MeasurementSet) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn get(&self) -> MeasurementSet {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MeasurementSet> {
        self.state.subscribe()
    }
}

impl Default for MeasurementCell {
    fn default() -> Self {
        Self::new()
    }
}
