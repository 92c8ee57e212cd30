use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::keyframes::{KeyframeCursor, KeyframeTrack};
use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;
use crate::core::rng::ParticleRng;
use crate::extensions::easing::Easing;

/// Keyframed per-axis size over a particle's life. Shrinks 1 → 0 unless configured.
///
/// With `random_size` on, each segment's endpoints are scaled by independent
/// factors in `[1 - tolerance, 1 + tolerance]`, drawn when the segment is entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub sizes: KeyframeTrack<Vec3>,
    #[serde(default)]
    pub random_size: bool,
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

fn default_tolerance() -> f32 {
    0.5
}

impl Default for SizeInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            sizes: KeyframeTrack::default(),
            random_size: false,
            tolerance: default_tolerance(),
        }
    }
}

impl SizeInfluencer {
    pub fn new(sizes: KeyframeTrack<Vec3>) -> Self {
        Self {
            sizes,
            ..Self::default()
        }
    }

    pub fn with_random_size(mut self, tolerance: f32) -> Self {
        self.random_size = true;
        self.tolerance = tolerance;
        self
    }

    pub fn add_size(&mut self, size: Vec3, curve: Easing) {
        self.sizes.push(size, curve);
    }

    fn perturb(&self, rng: &mut ParticleRng) -> f32 {
        if self.random_size {
            1.0 + rng.range(-self.tolerance, self.tolerance)
        } else {
            1.0
        }
    }

    fn load_segment(&self, particle: &mut Particle, cursor: &KeyframeCursor, rng: &mut ParticleRng) {
        let (start, end) = self.sizes.segment(cursor);
        particle.start_size = start * self.perturb(rng);
        particle.end_size = end * self.perturb(rng);
    }
}

impl Influencer for SizeInfluencer {
    fn name(&self) -> &'static str {
        "size"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn first_initialize(&mut self) {
        if !self
            .sizes
            .ensure_defaults(&[(Vec3::ONE, Easing::Linear), (Vec3::ZERO, Easing::Linear)])
        {
            log::warn!("size influencer needs at least two keyframes; disabling");
            self.enabled = false;
        }
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        if self.sizes.is_empty() {
            return;
        }
        let cursor = self.sizes.start(particle.start_life, ctx.rng);
        self.load_segment(particle, &cursor, ctx.rng);
        particle.size = particle.start_size;
        *particle.aux_mut::<KeyframeCursor>(ctx.id) = cursor;
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if self.sizes.is_empty() {
            return;
        }
        let mut cursor = *particle.aux_mut::<KeyframeCursor>(ctx.id);
        if self.sizes.advance(&mut cursor, dt) {
            self.load_segment(particle, &cursor, ctx.rng);
        }
        let blend = self.sizes.progress(&cursor);
        particle.size = particle.start_size.lerp(particle.end_size, blend);
        *particle.aux_mut::<KeyframeCursor>(ctx.id) = cursor;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Size(self.clone()))
    }

    fn duplicate(&self) -> Box<dyn Influencer> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
