use std::any::Any;
use std::rc::Rc;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::collider::{Collidable, CollisionProxy, Contact};
use crate::components::emitter::check_duration;
use crate::components::particle::Particle;
use crate::core::error::ConfigError;
use crate::core::math::reflect;

/// Random spread added to bounced velocity, as a fraction of speed.
const BOUNCE_JITTER: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionReaction {
    #[default]
    Bounce,
    Stick,
    Destroy,
}

/// Persistable part of the physics influencer. Collidables are attached at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub reaction: CollisionReaction,
    pub restitution: f32,
    /// Seconds a bounced particle ignores further collisions.
    pub collision_threshold: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            reaction: CollisionReaction::Bounce,
            restitution: 0.5,
            collision_threshold: 0.1,
        }
    }
}

impl PhysicsSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("collision_threshold", self.collision_threshold)?;
        check_duration("restitution", self.restitution)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cooldown {
    active: bool,
    elapsed: f32,
}

/// Tests every particle against host collidables and reacts to the closest hit.
#[derive(Debug, Default)]
pub struct PhysicsInfluencer {
    pub settings: PhysicsSettings,
    collidables: Vec<Rc<dyn Collidable>>,
}

impl PhysicsInfluencer {
    pub fn new(reaction: CollisionReaction) -> Self {
        Self::from_settings(PhysicsSettings {
            reaction,
            ..PhysicsSettings::default()
        })
    }

    pub fn from_settings(settings: PhysicsSettings) -> Self {
        Self {
            settings,
            collidables: Vec::new(),
        }
    }

    pub fn set_collision_threshold(&mut self, seconds: f32) -> Result<(), ConfigError> {
        check_duration("collision_threshold", seconds)?;
        self.settings.collision_threshold = seconds;
        Ok(())
    }

    pub fn set_restitution(&mut self, restitution: f32) -> Result<(), ConfigError> {
        check_duration("restitution", restitution)?;
        self.settings.restitution = restitution;
        Ok(())
    }

    pub fn add_collidable(&mut self, collidable: Rc<dyn Collidable>) {
        self.collidables.push(collidable);
    }

    /// Remove by identity. Returns false if it was not attached.
    pub fn remove_collidable(&mut self, collidable: &Rc<dyn Collidable>) -> bool {
        let before = self.collidables.len();
        self.collidables.retain(|c| !Rc::ptr_eq(c, collidable));
        self.collidables.len() != before
    }

    pub fn clear_collidables(&mut self) {
        self.collidables.clear();
    }

    pub fn collidables(&self) -> &[Rc<dyn Collidable>] {
        &self.collidables
    }

    fn closest_contact(&self, proxy: &CollisionProxy) -> Option<Contact> {
        let mut closest: Option<Contact> = None;
        for collidable in &self.collidables {
            match collidable.collide(proxy) {
                Ok(Some(contact)) => {
                    if closest.map_or(true, |c| contact.distance < c.distance) {
                        closest = Some(contact);
                    }
                }
                Ok(None) => {}
                Err(err) => log::warn!("skipping collidable {collidable:?}: {err}"),
            }
        }
        closest
    }
}

impl Influencer for PhysicsInfluencer {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        particle.reset_aux::<Cooldown>(ctx.id);
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        let mut cooldown = *particle.aux_mut::<Cooldown>(ctx.id);
        if cooldown.active {
            cooldown.elapsed += dt;
            if cooldown.elapsed < self.settings.collision_threshold {
                *particle.aux_mut::<Cooldown>(ctx.id) = cooldown;
                return;
            }
            cooldown = Cooldown::default();
        }

        let proxy = CollisionProxy {
            center: ctx.emitter.translation + particle.position,
            rotation: Quat::from_euler(EulerRot::XYZ, particle.angles.x, particle.angles.y, particle.angles.z),
            half_extents: particle.size * 0.5,
        };
        if let Some(contact) = self.closest_contact(&proxy) {
            match self.settings.reaction {
                CollisionReaction::Bounce => {
                    let speed = particle.velocity.length();
                    let jitter = Vec3::new(
                        ctx.rng.range(-1.0, 1.0),
                        ctx.rng.range(-1.0, 1.0),
                        ctx.rng.range(-1.0, 1.0),
                    ) * BOUNCE_JITTER
                        * speed;
                    particle.velocity = reflect(particle.velocity, contact.normal) * self.settings.restitution + jitter;
                    cooldown = Cooldown {
                        active: true,
                        elapsed: 0.0,
                    };
                }
                CollisionReaction::Stick => particle.velocity = Vec3::ZERO,
                CollisionReaction::Destroy => particle.kill(),
            }
        }
        *particle.aux_mut::<Cooldown>(ctx.id) = cooldown;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Physics(self.settings.clone()))
    }

    /// Collidables are shared with the copy.
    fn duplicate(&self) -> Box<dyn Influencer> {
        Box::new(Self {
            settings: self.settings.clone(),
            collidables: self.collidables.clone(),
        })
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
    use crate::components::collider::PlaneCollider;
    use crate::core::error::CollisionError;
    use crate::influencers::testing::Harness;

    #[derive(Debug)]
    struct Broken;

    impl Collidable for Broken {
        fn collide(&self, _proxy: &CollisionProxy) -> Result<Option<Contact>, CollisionError> {
            Err(CollisionError::Query("mesh not loaded".into()))
        }
    }

    fn floor() -> Rc<dyn Collidable> {
        Rc::new(PlaneCollider::new(Vec3::Y, 0.0))
    }

    fn falling(h: &Harness) -> Particle {
        let mut p = h.particle(1.0, Vec3::new(0.0, -2.0, 0.0));
        p.position = Vec3::new(0.0, 0.1, 0.0);
        p
    }

    #[test]
    fn bounce_reflects_with_restitution() {
        let mut h = Harness::new();
        let mut physics = PhysicsInfluencer::new(CollisionReaction::Bounce);
        physics.add_collidable(floor());
        let mut p = falling(&h);
        h.spawn(&mut physics, &mut p);
        h.step(&mut physics, &mut p, 0.016);
        // 1.0 up from the reflection, jitter at most 0.1 per axis
        assert!((p.velocity.y - 1.0).abs() <= 0.1 + 1e-5);
        assert!(p.velocity.x.abs() <= 0.1 + 1e-5);
    }

    #[test]
    fn cooldown_suppresses_repeat_hits() {
        let mut h = Harness::new();
        let mut physics = PhysicsInfluencer::new(CollisionReaction::Bounce);
        physics.add_collidable(floor());
        let mut p = falling(&h);
        h.spawn(&mut physics, &mut p);
        h.step(&mut physics, &mut p, 0.016);
        p.velocity = Vec3::new(0.0, -2.0, 0.0);
        h.step(&mut physics, &mut p, 0.016);
        assert_eq!(p.velocity, Vec3::new(0.0, -2.0, 0.0));
        h.step(&mut physics, &mut p, 0.1);
        assert!(p.velocity.y > 0.0);
    }

    #[test]
    fn stick_and_destroy() {
        let mut h = Harness::new();
        let mut stick = PhysicsInfluencer::new(CollisionReaction::Stick);
        stick.add_collidable(floor());
        let mut p = falling(&h);
        h.spawn(&mut stick, &mut p);
        h.step(&mut stick, &mut p, 0.016);
        assert_eq!(p.velocity, Vec3::ZERO);

        let mut destroy = PhysicsInfluencer::new(CollisionReaction::Destroy);
        destroy.add_collidable(floor());
        let mut p = falling(&h);
        h.spawn(&mut destroy, &mut p);
        h.step(&mut destroy, &mut p, 0.016);
        assert!(p.is_kill_requested());
    }

    #[test]
    fn failing_collidable_is_skipped() {
        let mut h = Harness::new();
        let mut physics = PhysicsInfluencer::new(CollisionReaction::Stick);
        physics.add_collidable(Rc::new(Broken));
        physics.add_collidable(floor());
        let mut p = falling(&h);
        h.spawn(&mut physics, &mut p);
        h.step(&mut physics, &mut p, 0.016);
        assert_eq!(p.velocity, Vec3::ZERO);
    }

    #[test]
    fn proxy_includes_emitter_translation() {
        let mut h = Harness::new();
        h.view.translation = Vec3::new(0.0, 10.0, 0.0);
        let mut physics = PhysicsInfluencer::new(CollisionReaction::Destroy);
        physics.add_collidable(floor());
        let mut p = falling(&h);
        h.spawn(&mut physics, &mut p);
        h.step(&mut physics, &mut p, 0.016);
        assert!(!p.is_kill_requested());
    }

    #[test]
    fn remove_collidable_by_identity() {
        let mut physics = PhysicsInfluencer::default();
        let plane = floor();
        physics.add_collidable(plane.clone());
        physics.add_collidable(floor());
        assert!(physics.remove_collidable(&plane));
        assert_eq!(physics.collidables().len(), 1);
        assert!(!physics.remove_collidable(&plane));
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let mut physics = PhysicsInfluencer::default();
        assert!(physics.set_collision_threshold(-0.5).is_err());
        assert_eq!(physics.settings.collision_threshold, 0.1);
        physics.set_collision_threshold(0.25).unwrap();
        assert_eq!(physics.settings.collision_threshold, 0.25);
    }
}
