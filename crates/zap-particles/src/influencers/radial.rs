use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadialPullCenter {
    #[default]
    EmissionPoint,
    EmitterCenter,
}

/// Replaces one component of the pull center with the particle's own, so the
/// particle orbits a line instead of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadialAxisLock {
    #[default]
    None,
    X,
    Y,
    Z,
}

/// Reference "up" used to derive the orbit tangent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadialUpAlignment {
    /// Normal of the particle's emission face.
    #[default]
    Normal,
    UnitX,
    UnitY,
    UnitZ,
}

/// Orbital motion: a centripetal pull plus a tangential push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialVelocityInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub radial_pull: f32,
    pub tangent_force: f32,
    #[serde(default)]
    pub pull_center: RadialPullCenter,
    #[serde(default)]
    pub axis_lock: RadialAxisLock,
    #[serde(default)]
    pub up_alignment: RadialUpAlignment,
    /// Pick the orbit direction per particle at random.
    #[serde(default)]
    pub random_direction: bool,
}

#[derive(Debug, Clone, Copy)]
struct OrbitSign(f32);

impl Default for OrbitSign {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Default for RadialVelocityInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            radial_pull: 1.0,
            tangent_force: 1.0,
            pull_center: RadialPullCenter::EmissionPoint,
            axis_lock: RadialAxisLock::None,
            up_alignment: RadialUpAlignment::Normal,
            random_direction: false,
        }
    }
}

impl RadialVelocityInfluencer {
    pub fn new(radial_pull: f32, tangent_force: f32) -> Self {
        Self {
            radial_pull,
            tangent_force,
            ..Self::default()
        }
    }
}

impl Influencer for RadialVelocityInfluencer {
    fn name(&self) -> &'static str {
        "radial_velocity"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        let sign = if self.random_direction { ctx.rng.sign() } else { 1.0 };
        *particle.aux_mut::<OrbitSign>(ctx.id) = OrbitSign(sign);
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        let mut center = match self.pull_center {
            RadialPullCenter::EmissionPoint => ctx.emission_point(particle),
            RadialPullCenter::EmitterCenter => ctx.shape.bound_center(),
        };
        match self.axis_lock {
            RadialAxisLock::None => {}
            RadialAxisLock::X => center.x = particle.position.x,
            RadialAxisLock::Y => center.y = particle.position.y,
            RadialAxisLock::Z => center.z = particle.position.z,
        }

        let radial = (center - particle.position).normalize_or_zero();
        let up = match self.up_alignment {
            RadialUpAlignment::Normal => ctx.emission_normal(particle),
            RadialUpAlignment::UnitX => Vec3::X,
            RadialUpAlignment::UnitY => Vec3::Y,
            RadialUpAlignment::UnitZ => Vec3::Z,
        };
        // up with its radial component removed
        let axis = radial.cross(up).cross(radial).normalize_or_zero();
        let tangent = axis.cross(radial);

        let sign = particle.aux_mut::<OrbitSign>(ctx.id).0;
        particle.velocity += radial * self.radial_pull * dt + tangent * self.tangent_force * sign * dt;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::RadialVelocity(self.clone()))
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

    fn orbiting(h: &mut Harness, radial: &mut RadialVelocityInfluencer) -> Particle {
        let mut p = h.particle(1.0, Vec3::ZERO);
        p.position = Vec3::new(1.0, 0.0, 0.0);
        h.spawn(radial, &mut p);
        p
    }

    #[test]
    fn pulls_toward_center_and_pushes_along_tangent() {
        let mut h = Harness::new();
        let mut radial = RadialVelocityInfluencer::new(1.0, 2.0);
        radial.pull_center = RadialPullCenter::EmitterCenter;
        radial.up_alignment = RadialUpAlignment::UnitY;
        let mut p = orbiting(&mut h, &mut radial);
        h.step(&mut radial, &mut p, 0.5);
        // radial -X, axis +Y, tangent = Y x -X = +Z
        assert!(p.velocity.abs_diff_eq(Vec3::new(-0.5, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn axis_lock_keeps_pull_in_plane() {
        let mut h = Harness::new();
        let mut radial = RadialVelocityInfluencer::new(1.0, 0.0);
        radial.pull_center = RadialPullCenter::EmitterCenter;
        radial.axis_lock = RadialAxisLock::Y;
        let mut p = h.particle(1.0, Vec3::ZERO);
        p.position = Vec3::new(0.0, 5.0, 2.0);
        h.spawn(&mut radial, &mut p);
        h.step(&mut radial, &mut p, 1.0);
        assert_eq!(p.velocity.y, 0.0);
        assert!(p.velocity.z < 0.0);
    }

    #[test]
    fn random_direction_flips_tangent_only() {
        let mut h = Harness::new();
        let mut radial = RadialVelocityInfluencer::new(0.0, 1.0);
        radial.pull_center = RadialPullCenter::EmitterCenter;
        radial.up_alignment = RadialUpAlignment::UnitY;
        radial.random_direction = true;
        let mut seen = [false; 2];
        for _ in 0..32 {
            let mut p = orbiting(&mut h, &mut radial);
            h.step(&mut radial, &mut p, 1.0);
            assert!((p.velocity.z.abs() - 1.0).abs() < 1e-5);
            seen[usize::from(p.velocity.z > 0.0)] = true;
        }
        assert_eq!(seen, [true, true]);
    }
}
