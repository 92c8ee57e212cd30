use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;

/// Random velocity kicks.
///
/// Each frame a kick fires with probability `chance + dt`, so the kick rate
/// depends on frame time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulseInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub chance: f32,
    pub strength: f32,
    /// How far velocity moves toward the kicked velocity, 0 to 1.
    pub magnitude: f32,
}

impl Default for ImpulseInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            chance: 0.02,
            strength: 3.0,
            magnitude: 0.2,
        }
    }
}

impl ImpulseInfluencer {
    pub fn new(chance: f32, strength: f32, magnitude: f32) -> Self {
        Self {
            enabled: true,
            chance,
            strength,
            magnitude,
        }
    }
}

impl Influencer for ImpulseInfluencer {
    fn name(&self) -> &'static str {
        "impulse"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn initialize(&mut self, _particle: &mut Particle, _ctx: &mut InfluencerContext) {}

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if !ctx.rng.chance(self.chance + dt) {
            return;
        }
        let rng = &mut *ctx.rng;
        let mut kick = Vec3::new(rng.next_f32(), rng.next_f32(), rng.next_f32()) * self.strength;
        for axis in 0..3 {
            kick[axis] *= rng.sign();
        }
        kick *= particle.velocity.length();
        let target = particle.velocity + kick;
        particle.velocity = particle.velocity.lerp(target, self.magnitude);
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Impulse(self.clone()))
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
