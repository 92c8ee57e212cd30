use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::keyframes::{Blend, KeyframeCursor, KeyframeTrack};
use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;
use crate::extensions::easing::Easing;

/// A point particles are pulled toward and how hard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Vec3,
    pub weight: f32,
}

impl Waypoint {
    pub fn new(point: Vec3, weight: f32) -> Self {
        Self { point, weight }
    }
}

impl Blend for Waypoint {
    fn blend(self, other: Self, t: f32) -> Self {
        Self {
            point: self.point.lerp(other.point, t),
            weight: self.weight.blend(other.weight, t),
        }
    }
}

/// Steers velocity toward the current keyframe's waypoint, ramping up over
/// each segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub waypoints: KeyframeTrack<Waypoint>,
}

/// Steering gain applied on top of the waypoint weight.
const STEER_GAIN: f32 = 10.0;

impl Default for DestinationInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            waypoints: KeyframeTrack::default(),
        }
    }
}

impl DestinationInfluencer {
    pub fn new(waypoints: KeyframeTrack<Waypoint>) -> Self {
        Self {
            enabled: true,
            waypoints,
        }
    }

    pub fn add_destination(&mut self, point: Vec3, weight: f32, curve: Easing) {
        self.waypoints.push(Waypoint::new(point, weight), curve);
    }
}

impl Influencer for DestinationInfluencer {
    fn name(&self) -> &'static str {
        "destination"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn first_initialize(&mut self) {
        let origin = Waypoint::new(Vec3::ZERO, 0.5);
        if !self
            .waypoints
            .ensure_defaults(&[(origin, Easing::Linear), (origin, Easing::Linear)])
        {
            log::warn!("destination influencer needs at least two keyframes; disabling");
            self.enabled = false;
        }
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        if self.waypoints.is_empty() {
            return;
        }
        let cursor = self.waypoints.start(particle.start_life, ctx.rng);
        *particle.aux_mut::<KeyframeCursor>(ctx.id) = cursor;
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if self.waypoints.is_empty() {
            return;
        }
        let cursor = *particle.aux_mut::<KeyframeCursor>(ctx.id);
        let mut next = cursor;
        self.waypoints.advance(&mut next, dt);
        let target = self.waypoints.keys[next.index].value;
        let blend = self.waypoints.progress(&next);

        let pull = target.point - particle.position;
        let t = (blend * dt * target.weight * STEER_GAIN).clamp(0.0, 1.0);
        particle.velocity = particle.velocity.lerp(pull, t);
        *particle.aux_mut::<KeyframeCursor>(ctx.id) = next;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Destination(self.clone()))
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
    fn steers_toward_waypoint() {
        let mut h = Harness::new();
        let mut dest = DestinationInfluencer::default();
        dest.add_destination(Vec3::new(10.0, 0.0, 0.0), 1.0, Easing::Linear);
        dest.add_destination(Vec3::new(10.0, 0.0, 0.0), 1.0, Easing::Linear);
        let mut p = h.particle(1.0, Vec3::Y);
        h.spawn(&mut dest, &mut p);
        for _ in 0..10 {
            h.step(&mut dest, &mut p, 0.09);
        }
        assert!(p.velocity.x > 0.5);
        assert!(p.velocity.y < 0.5);
    }

    #[test]
    fn no_pull_at_segment_start() {
        let mut h = Harness::new();
        let mut dest = DestinationInfluencer::default();
        let mut p = h.particle(1.0, Vec3::Y);
        p.position = Vec3::new(0.0, 1.0, 0.0);
        h.spawn(&mut dest, &mut p);
        h.step(&mut dest, &mut p, 0.0);
        assert_eq!(p.velocity, Vec3::Y);
    }

    #[test]
    fn waypoints_blend_point_and_weight() {
        let a = Waypoint::new(Vec3::ZERO, 0.0);
        let b = Waypoint::new(Vec3::splat(2.0), 1.0);
        assert_eq!(a.blend(b, 0.5), Waypoint::new(Vec3::ONE, 0.5));
    }
}
