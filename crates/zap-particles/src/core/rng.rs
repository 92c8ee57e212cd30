//! Seedable random source threaded through the shape sampler and influencers.
//! Deterministic for a given seed, so simulations can be replayed in tests.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seedable pseudo-random number generator shared by one emitter.
#[derive(Debug, Clone)]
pub struct ParticleRng {
    inner: StdRng,
}

impl ParticleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns a float in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Returns a float in [min, max). Returns `min` for an empty range.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + self.next_f32() * (max - min)
    }

    /// Returns an index in [0, upper). Returns 0 when `upper` is 0.
    #[inline]
    pub fn index(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.inner.random_range(0..upper)
    }

    #[inline]
    pub fn coin(&mut self) -> bool {
        self.inner.random::<bool>()
    }

    /// Returns `1.0` or `-1.0` with equal probability.
    #[inline]
    pub fn sign(&mut self) -> f32 {
        if self.coin() { 1.0 } else { -1.0 }
    }

    /// Returns an angle in [0, 2π).
    #[inline]
    pub fn angle(&mut self) -> f32 {
        self.next_f32() * TAU
    }

    /// True with probability `p` (values outside [0, 1] saturate).
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}

impl Default for ParticleRng {
    fn default() -> Self {
        Self::new(42)
    }
}
