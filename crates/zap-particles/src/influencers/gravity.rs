use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;

/// What gravity pulls toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GravityAlignment {
    /// Constant world-space vector, subtracted from velocity.
    #[default]
    World,
    /// Back along the spawn velocity.
    ReverseVelocity,
    /// The particle's emission point on the emitter shape.
    EmissionPoint,
    /// The bounding center of the emitter shape.
    EmitterCenter,
}

/// Gravity in one of four alignments. Inactive for static particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravityInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    #[serde(default)]
    pub alignment: GravityAlignment,
    #[serde(default = "default_magnitude")]
    pub magnitude: f32,
}

fn default_gravity() -> Vec3 {
    Vec3::Y
}

fn default_magnitude() -> f32 {
    1.0
}

impl Default for GravityInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            gravity: default_gravity(),
            alignment: GravityAlignment::World,
            magnitude: default_magnitude(),
        }
    }
}

impl GravityInfluencer {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    pub fn with_alignment(mut self, alignment: GravityAlignment, magnitude: f32) -> Self {
        self.alignment = alignment;
        self.magnitude = magnitude;
        self
    }

    fn pull_toward(&self, particle: &mut Particle, target: Vec3, dt: f32) {
        let pull = target - particle.position;
        particle.velocity += pull * particle.initial_length * self.magnitude * dt;
    }
}

impl Influencer for GravityInfluencer {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn initialize(&mut self, particle: &mut Particle, _ctx: &mut InfluencerContext) {
        if self.alignment == GravityAlignment::ReverseVelocity {
            particle.reverse_velocity = -particle.velocity * self.magnitude;
        }
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if ctx.emitter.static_particles {
            return;
        }
        match self.alignment {
            GravityAlignment::World => particle.velocity -= self.gravity * dt,
            GravityAlignment::ReverseVelocity => particle.velocity += particle.reverse_velocity * dt,
            GravityAlignment::EmissionPoint => {
                let target = ctx.emission_point(particle);
                self.pull_toward(particle, target, dt);
            }
            GravityAlignment::EmitterCenter => {
                let target = ctx.shape.bound_center();
                self.pull_toward(particle, target, dt);
            }
        }
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Gravity(self.clone()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::influencers::testing::Harness;

    #[test]
    fn world_gravity_subtracts_per_frame() {
        let mut h = Harness::new();
        let mut gravity = GravityInfluencer::default();
        let mut p = h.particle(1.0, Vec3::ZERO);
        h.spawn(&mut gravity, &mut p);
        h.step(&mut gravity, &mut p, 0.016);
        assert_eq!(p.velocity, Vec3::new(0.0, -0.016, 0.0));
    }

    #[test]
    fn static_particles_ignore_gravity() {
        let mut h = Harness::new();
        h.view.static_particles = true;
        let mut gravity = GravityInfluencer::default();
        let mut p = h.particle(1.0, Vec3::ZERO);
        h.spawn(&mut gravity, &mut p);
        h.step(&mut gravity, &mut p, 0.5);
        assert_eq!(p.velocity, Vec3::ZERO);
    }

    #[test]
    fn reverse_velocity_captures_spawn_velocity() {
        let mut h = Harness::new();
        let mut gravity = GravityInfluencer::default().with_alignment(GravityAlignment::ReverseVelocity, 0.5);
        let mut p = h.particle(1.0, Vec3::new(2.0, 0.0, 0.0));
        h.spawn(&mut gravity, &mut p);
        assert_eq!(p.reverse_velocity, Vec3::new(-1.0, 0.0, 0.0));
        h.step(&mut gravity, &mut p, 0.5);
        assert_eq!(p.velocity, Vec3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn emitter_center_pulls_inward() {
        let mut h = Harness::new();
        let mut gravity = GravityInfluencer::default().with_alignment(GravityAlignment::EmitterCenter, 1.0);
        let mut p = h.particle(1.0, Vec3::new(0.0, 1.0, 0.0));
        p.position = Vec3::new(2.0, 0.0, 0.0);
        h.spawn(&mut gravity, &mut p);
        h.step(&mut gravity, &mut p, 0.1);
        assert!(p.velocity.x < 0.0);
    }

    #[test]
    fn emission_point_pulls_back_to_spawn_face() {
        let mut h = Harness::new();
        let mut gravity = GravityInfluencer::default().with_alignment(GravityAlignment::EmissionPoint, 1.0);
        let mut p = h.particle(1.0, Vec3::ZERO);
        p.initial_length = 1.0;
        p.triangle_index = Some(0);
        let center = h.shape.select_triangle(0).center;
        p.position = center + Vec3::new(0.0, 3.0, 0.0);
        h.spawn(&mut gravity, &mut p);
        h.step(&mut gravity, &mut p, 0.1);
        assert!(p.velocity.abs_diff_eq(Vec3::new(0.0, -0.3, 0.0), 1e-5));
    }
}
