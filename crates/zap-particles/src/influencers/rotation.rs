use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::keyframes::{KeyframeCursor, KeyframeTrack};
use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;
use crate::core::rng::ParticleRng;
use crate::extensions::easing::Easing;

/// Keyframed angular velocity in radians per second.
///
/// Unlike the other keyframed influencers a single keyframe is valid: the
/// particle then spins at that constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub speeds: KeyframeTrack<Vec3>,
    /// Flip the spin direction per axis at random.
    #[serde(default)]
    pub random_direction: [bool; 3],
    /// Scale every speed keyframe by a random per-axis factor in [0, 1).
    #[serde(default)]
    pub random_speed: bool,
    /// Start at a random angle per axis.
    #[serde(default)]
    pub random_start_rotation: [bool; 3],
}

/// Per-particle spin modifiers chosen at spawn.
#[derive(Debug, Clone, Copy, Default)]
struct SpinState {
    cursor: KeyframeCursor,
    factor: Vec3,
}

impl Default for RotationInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            speeds: KeyframeTrack::default(),
            random_direction: [false; 3],
            random_speed: false,
            random_start_rotation: [false; 3],
        }
    }
}

impl RotationInfluencer {
    pub fn new(speeds: KeyframeTrack<Vec3>) -> Self {
        Self {
            speeds,
            ..Self::default()
        }
    }

    pub fn add_speed(&mut self, speed: Vec3, curve: Easing) {
        self.speeds.push(speed, curve);
    }

    fn spin_factor(&self, rng: &mut ParticleRng) -> Vec3 {
        let mut factor = Vec3::ONE;
        for axis in 0..3 {
            if self.random_direction[axis] {
                factor[axis] *= rng.sign();
            }
            if self.random_speed {
                factor[axis] *= rng.next_f32();
            }
        }
        factor
    }
}

impl Influencer for RotationInfluencer {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn first_initialize(&mut self) {
        self.speeds
            .ensure_defaults(&[(Vec3::new(0.0, 0.0, 10f32.to_radians()), Easing::Linear)]);
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        if self.speeds.is_empty() {
            return;
        }
        let factor = self.spin_factor(ctx.rng);
        let cursor = self.speeds.start(particle.start_life, ctx.rng);
        particle.rotation_speed = self.speeds.keys[cursor.index].value * factor;
        for axis in 0..3 {
            particle.angles[axis] = if self.random_start_rotation[axis] {
                ctx.rng.angle()
            } else {
                0.0
            };
        }
        *particle.aux_mut::<SpinState>(ctx.id) = SpinState { cursor, factor };
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if self.speeds.len() > 1 {
            let state = particle.aux_mut::<SpinState>(ctx.id);
            self.speeds.advance(&mut state.cursor, dt);
            let speed = self.speeds.value_at(&state.cursor) * state.factor;
            particle.rotation_speed = speed;
        }
        particle.angles += particle.rotation_speed * dt;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Rotation(self.clone()))
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
