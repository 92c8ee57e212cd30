//! Emission timing and free-slot tracking.

use crate::components::emitter::EmitterConfig;
use crate::systems::pool::ParticlePool;

/// Absorbs float error so that whole intervals are not lost to rounding.
const COUNT_EPSILON: f32 = 1e-4;

/// Decides how many particles to emit each frame and where the next free
/// pool slot is.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionScheduler {
    /// Time accumulated toward the next emission.
    current_interval: f32,
    /// Time the emitter has been running, for delay and lifetime.
    emitted_time: f32,
    /// Lowest known free slot. `None` while the pool is full.
    next_free: Option<usize>,
}

impl Default for EmissionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EmissionScheduler {
    pub fn new() -> Self {
        Self {
            current_interval: 0.0,
            emitted_time: 0.0,
            next_free: Some(0),
        }
    }

    pub fn current_interval(&self) -> f32 {
        self.current_interval
    }

    pub fn emitted_time(&self) -> f32 {
        self.emitted_time
    }

    pub fn next_free(&self) -> Option<usize> {
        self.next_free
    }

    /// Drop accumulated emission time while the emitter is disabled.
    pub fn pause(&mut self) {
        self.current_interval = 0.0;
    }

    /// Zero both clocks so delay and lifetime start over.
    pub fn restart(&mut self) {
        self.current_interval = 0.0;
        self.emitted_time = 0.0;
    }

    /// Forget slot tracking after the pool was emptied or reallocated.
    pub fn rewind_slots(&mut self) {
        self.next_free = Some(0);
    }

    pub fn advance_clock(&mut self, dt: f32) {
        self.emitted_time += dt;
    }

    fn in_window(&self, config: &EmitterConfig) -> bool {
        let started = config.start_delay == 0.0 || self.emitted_time > config.start_delay;
        let alive = config.emitter_life == 0.0 || self.emitted_time < config.emitter_life;
        started && alive
    }

    /// Particles to emit this frame.
    ///
    /// Whole intervals accumulated are consumed whether or not the emitter is
    /// inside its delay/lifetime window, so no backlog builds up while waiting.
    pub fn take_emissions(&mut self, dt: f32, config: &EmitterConfig) -> usize {
        let target = config.target_interval();
        self.current_interval += dt;
        let ratio = self.current_interval / target;
        if ratio + COUNT_EPSILON < 1.0 {
            return 0;
        }
        let per_emission = config.particles_per_emission.max(1) as f32;
        let count = if self.in_window(config) {
            (ratio * per_emission + COUNT_EPSILON).floor() as usize
        } else {
            0
        };
        let consumed = if count > 0 {
            count as f32 / per_emission
        } else {
            (ratio + COUNT_EPSILON).floor()
        };
        self.current_interval = (self.current_interval - consumed * target).max(0.0);
        count
    }

    /// Slot to spawn into next, or `None` if the pool has no free slot.
    pub fn claim_slot(&mut self, pool: &ParticlePool) -> Option<usize> {
        let hint = self.next_free?;
        if hint >= pool.capacity() {
            return None;
        }
        if pool.get(hint).is_active() {
            self.next_free = pool.find_free_after(hint);
            return self.next_free;
        }
        Some(hint)
    }

    /// Record that `index` was just filled.
    pub fn slot_filled(&mut self, index: usize, pool: &ParticlePool) {
        self.next_free = pool.find_free_after(index);
    }

    /// Record that `index` was just freed. Keeps the hint at the lowest free slot seen.
    pub fn slot_freed(&mut self, index: usize) {
        if self.next_free.map_or(true, |hint| index < hint) {
            self.next_free = Some(index);
        }
    }
}
