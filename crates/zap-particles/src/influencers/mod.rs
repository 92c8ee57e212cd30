//! Influencer pipeline: pluggable behavior modules applied to every particle
//! each frame, in chain order.
//!
//! Each influencer sees the particle after every earlier influencer in the
//! chain has mutated it during the same frame. Per-particle private state
//! (keyframe cursors, cooldowns, random signs) lives in the particle's
//! auxiliary slots under the influencer's [`InfluencerId`].

mod alpha;
mod chain;
mod color;
mod conditional;
mod destination;
mod gravity;
mod impulse;
pub mod keyframes;
#[cfg(feature = "physics")]
mod physics;
mod radial;
mod rotation;
mod size;
mod sprite;

use std::any::Any;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::components::particle::Particle;
use crate::components::shape::EmitterShape;
use crate::core::error::ConfigError;
use crate::core::rng::ParticleRng;

pub use alpha::AlphaInfluencer;
pub use chain::InfluencerChain;
pub use color::ColorInfluencer;
pub use conditional::{Condition, ConditionalInfluencer};
pub use destination::{DestinationInfluencer, Waypoint};
pub use gravity::{GravityAlignment, GravityInfluencer};
pub use impulse::ImpulseInfluencer;
pub use keyframes::{Blend, Keyframe, KeyframeCursor, KeyframeTrack};
#[cfg(feature = "physics")]
pub use physics::{CollisionReaction, PhysicsInfluencer, PhysicsSettings};
pub use radial::{RadialAxisLock, RadialPullCenter, RadialUpAlignment, RadialVelocityInfluencer};
pub use rotation::RotationInfluencer;
pub use size::SizeInfluencer;
pub use sprite::SpriteInfluencer;

/// Identity of an influencer within one chain. Assigned by the chain, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfluencerId(pub u32);

/// Read-only emitter settings visible to influencers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterView {
    pub static_particles: bool,
    pub random_emission_point: bool,
    pub sprite_cols: u32,
    pub sprite_rows: u32,
    /// Emitter translation from the host; particle positions exclude it.
    pub translation: Vec3,
}

impl Default for EmitterView {
    fn default() -> Self {
        Self {
            static_particles: false,
            random_emission_point: false,
            sprite_cols: 1,
            sprite_rows: 1,
            translation: Vec3::ZERO,
        }
    }
}

/// Emitter-owned collaborators lent to the pool and the chain for one call.
pub struct EmitterEnv<'a> {
    pub rng: &'a mut ParticleRng,
    pub shape: &'a mut EmitterShape,
    pub view: EmitterView,
}

/// Requests an influencer makes against its own chain during a call.
/// Applied by the chain as soon as the call returns.
#[derive(Default)]
pub(crate) struct ChainOps {
    pub(crate) next_id: u32,
    pub(crate) registrations: Vec<(InfluencerId, Box<dyn Influencer>)>,
    pub(crate) toggles: Vec<(InfluencerId, bool)>,
}

impl ChainOps {
    pub(crate) fn reserve_id(&mut self) -> InfluencerId {
        let id = InfluencerId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl fmt::Debug for ChainOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainOps")
            .field("next_id", &self.next_id)
            .field("pending_registrations", &self.registrations.len())
            .field("pending_toggles", &self.toggles.len())
            .finish()
    }
}

/// Everything an influencer may touch besides the particle itself.
pub struct InfluencerContext<'a> {
    /// Id of the influencer being called; key for its auxiliary state.
    pub id: InfluencerId,
    pub rng: &'a mut ParticleRng,
    pub shape: &'a mut EmitterShape,
    pub emitter: EmitterView,
    pub(crate) ops: &'a mut ChainOps,
}

impl InfluencerContext<'_> {
    /// Hand an influencer to the chain. It is inserted right after the caller,
    /// disabled, under the returned id.
    pub fn register(&mut self, influencer: Box<dyn Influencer>) -> InfluencerId {
        let id = self.ops.reserve_id();
        self.ops.registrations.push((id, influencer));
        id
    }

    /// Enable or disable another influencer of the same chain. Takes effect
    /// before the next influencer in the chain runs.
    pub fn set_enabled(&mut self, id: InfluencerId, enabled: bool) {
        self.ops.toggles.push((id, enabled));
    }

    /// Where `particle` was emitted, re-sampled from its emission face so that
    /// emitter rotation and scale changes are followed.
    pub fn emission_point(&mut self, particle: &Particle) -> Vec3 {
        match particle.triangle_index {
            Some(index) if index < self.shape.triangle_count() => {
                let center = self.shape.select_triangle(index).center;
                if self.emitter.random_emission_point {
                    center + particle.random_offset
                } else {
                    center
                }
            }
            _ => particle.initial_position,
        }
    }

    /// Normal of the particle's emission face, +Y if it has none.
    pub fn emission_normal(&mut self, particle: &Particle) -> Vec3 {
        match particle.triangle_index {
            Some(index) if index < self.shape.triangle_count() => self.shape.select_triangle(index).normal,
            _ => Vec3::Y,
        }
    }
}

/// A behavior module in the influencer chain.
///
/// `initialize` runs when a particle spawns, `update` every frame while it
/// lives, `reset` when it dies. `first_initialize` runs once per influencer
/// instance, right before the first particle is initialized with it.
pub trait Influencer: fmt::Debug + Any {
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn first_initialize(&mut self) {}

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext);

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext);

    fn reset(&mut self, _particle: &mut Particle, _ctx: &mut InfluencerContext) {}

    /// Persistable configuration, or `None` for runtime-only influencers.
    fn describe(&self) -> Option<InfluencerDesc> {
        None
    }

    /// Copy of the configuration with fresh runtime state.
    fn duplicate(&self) -> Box<dyn Influencer>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Persisted form of an influencer: type identity plus its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InfluencerDesc {
    Alpha(AlphaInfluencer),
    Color(ColorInfluencer),
    Size(SizeInfluencer),
    Rotation(RotationInfluencer),
    Destination(DestinationInfluencer),
    Sprite(SpriteInfluencer),
    Gravity(GravityInfluencer),
    Impulse(ImpulseInfluencer),
    RadialVelocity(RadialVelocityInfluencer),
    #[cfg(feature = "physics")]
    Physics(PhysicsSettings),
}

impl InfluencerDesc {
    /// Check settings that would otherwise stall or corrupt the per-frame update.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            InfluencerDesc::Alpha(inf) => inf.alphas.validate(),
            InfluencerDesc::Color(inf) => inf.colors.validate(),
            InfluencerDesc::Size(inf) => inf.sizes.validate(),
            InfluencerDesc::Rotation(inf) => inf.speeds.validate(),
            InfluencerDesc::Destination(inf) => inf.waypoints.validate(),
            InfluencerDesc::Sprite(inf) => inf.validate(),
            InfluencerDesc::Gravity(_) | InfluencerDesc::Impulse(_) | InfluencerDesc::RadialVelocity(_) => Ok(()),
            #[cfg(feature = "physics")]
            InfluencerDesc::Physics(settings) => settings.validate(),
        }
    }

    pub fn build(self) -> Box<dyn Influencer> {
        match self {
            InfluencerDesc::Alpha(inf) => Box::new(inf),
            InfluencerDesc::Color(inf) => Box::new(inf),
            InfluencerDesc::Size(inf) => Box::new(inf),
            InfluencerDesc::Rotation(inf) => Box::new(inf),
            InfluencerDesc::Destination(inf) => Box::new(inf),
            InfluencerDesc::Sprite(inf) => Box::new(inf),
            InfluencerDesc::Gravity(inf) => Box::new(inf),
            InfluencerDesc::Impulse(inf) => Box::new(inf),
            InfluencerDesc::RadialVelocity(inf) => Box::new(inf),
            #[cfg(feature = "physics")]
            InfluencerDesc::Physics(settings) => Box::new(PhysicsInfluencer::from_settings(settings)),
        }
    }
}

pub(crate) fn default_enabled() -> bool {
    true
}
