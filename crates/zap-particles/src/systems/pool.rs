//! Fixed-capacity particle pool.

use glam::{Vec3, Vec4};

use crate::components::emitter::{EmissionPoint, EmitterConfig};
use crate::components::particle::Particle;
use crate::influencers::{EmitterEnv, InfluencerChain};

/// Outcome of advancing one slot by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    /// The slot was already free.
    Idle,
    /// The particle lives on.
    Alive,
    /// The particle died this frame and the slot is free again.
    Died,
}

/// Pre-allocated particle records, reused in place.
///
/// `active_count()` always equals the number of active records.
#[derive(Debug)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    active_count: usize,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: (0..capacity).map(Particle::new).collect(),
            active_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Panics if `index` is out of range.
    pub fn get(&self, index: usize) -> &Particle {
        &self.particles[index]
    }

    /// Panics if `index` is out of range.
    pub fn get_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.particles[index]
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.is_active())
    }

    /// Spawn a particle into slot `index` and run the chain's spawn hooks.
    ///
    /// Panics if `index` is out of range.
    pub fn initialize_slot(
        &mut self,
        index: usize,
        config: &EmitterConfig,
        chain: &mut InfluencerChain,
        env: &mut EmitterEnv,
    ) {
        let particle = &mut self.particles[index];
        debug_assert!(!particle.is_active(), "slot {index} is already live");
        if particle.is_active() {
            return;
        }
        particle.clear();

        particle.start_life = env.rng.range(config.life_min, config.life_max);
        let force = env.rng.range(config.force_min, config.force_max);

        let (position, offset, direction) = match env.shape.select_next(env.rng) {
            Some(triangle) => {
                let offset = match config.emission_point {
                    EmissionPoint::Center => Vec3::ZERO,
                    EmissionPoint::RandomPoint => triangle.random_offset(env.rng),
                };
                particle.triangle_index = env.shape.current_index();
                let direction = triangle.direction(config.direction, env.rng);
                (triangle.center + offset, offset, direction.normalize_or_zero())
            }
            None => (Vec3::ZERO, Vec3::ZERO, Vec3::Y),
        };

        particle.position = position;
        particle.initial_position = position;
        particle.random_offset = offset;
        particle.velocity = direction * force;
        particle.initial_length = force;
        particle.size = Vec3::ONE;
        particle.color = Vec4::ONE;
        particle.alpha = 1.0;
        particle.age = 0.0;
        particle.active = true;
        self.active_count += 1;

        chain.initialize(particle, env);
    }

    /// Age slot `index` by `dt` and run the chain's per-frame hooks.
    /// Position integration is left to the caller.
    pub fn update_slot(
        &mut self,
        index: usize,
        dt: f32,
        chain: &mut InfluencerChain,
        env: &mut EmitterEnv,
    ) -> SlotUpdate {
        let particle = &mut self.particles[index];
        if !particle.is_active() {
            return SlotUpdate::Idle;
        }
        particle.age += dt;
        if particle.age >= particle.start_life {
            self.reset_slot(index, chain, env);
            return SlotUpdate::Died;
        }
        chain.update(particle, dt, env);
        if particle.is_kill_requested() {
            self.reset_slot(index, chain, env);
            return SlotUpdate::Died;
        }
        SlotUpdate::Alive
    }

    /// Kill slot `index` through the chain's reset hooks. Returns false if it
    /// was already free.
    pub fn reset_slot(&mut self, index: usize, chain: &mut InfluencerChain, env: &mut EmitterEnv) -> bool {
        let particle = &mut self.particles[index];
        if !particle.is_active() {
            return false;
        }
        chain.reset(particle, env);
        particle.clear();
        self.active_count -= 1;
        true
    }

    /// Next free slot after `index`, wrapping around. `None` when the pool is full.
    pub fn find_free_after(&self, index: usize) -> Option<usize> {
        let capacity = self.capacity();
        (1..=capacity)
            .map(|step| (index + step) % capacity)
            .find(|&i| !self.particles[i].is_active())
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::rc::Rc;

    use super::*;
    use crate::components::mesh::TriMesh;
    use crate::components::shape::EmitterShape;
    use crate::core::rng::ParticleRng;
    use crate::influencers::{AlphaInfluencer, EmitterView, Influencer, InfluencerContext};

    struct Fixture {
        rng: ParticleRng,
        shape: EmitterShape,
        chain: InfluencerChain,
        config: EmitterConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                rng: ParticleRng::new(11),
                shape: EmitterShape::new(Rc::new(TriMesh::quad(2.0, 2.0))),
                chain: InfluencerChain::new(),
                config: EmitterConfig::new().with_life(1.0, 1.0).with_force(2.0, 2.0),
            }
        }

        fn spawn(&mut self, pool: &mut ParticlePool, index: usize) {
            let mut env = EmitterEnv {
                rng: &mut self.rng,
                shape: &mut self.shape,
                view: EmitterView::default(),
            };
            pool.initialize_slot(index, &self.config, &mut self.chain, &mut env);
        }

        fn update(&mut self, pool: &mut ParticlePool, index: usize, dt: f32) -> SlotUpdate {
            let mut env = EmitterEnv {
                rng: &mut self.rng,
                shape: &mut self.shape,
                view: EmitterView::default(),
            };
            pool.update_slot(index, dt, &mut self.chain, &mut env)
        }

        fn reset(&mut self, pool: &mut ParticlePool, index: usize) -> bool {
            let mut env = EmitterEnv {
                rng: &mut self.rng,
                shape: &mut self.shape,
                view: EmitterView::default(),
            };
            pool.reset_slot(index, &mut self.chain, &mut env)
        }
    }

    #[test]
    fn spawn_sets_life_force_and_direction() {
        let mut fx = Fixture::new();
        let mut pool = ParticlePool::new(4);
        fx.spawn(&mut pool, 2);
        let p = pool.get(2);
        assert!(p.is_active());
        assert_eq!(pool.active_count(), 1);
        assert_eq!(p.start_life, 1.0);
        assert_eq!(p.initial_length, 2.0);
        // quad faces +Y, default direction is the face normal
        assert!(p.velocity.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
        assert_eq!(p.position, p.initial_position);
        assert_eq!(p.alpha, 1.0);
        assert!(p.triangle_index.is_some());
    }

    #[test]
    fn random_point_offsets_stay_on_the_face() {
        let mut fx = Fixture::new();
        fx.config.emission_point = EmissionPoint::RandomPoint;
        let mut pool = ParticlePool::new(16);
        for i in 0..16 {
            fx.spawn(&mut pool, i);
            let p = pool.get(i);
            assert!(p.position.y.abs() < 1e-5);
            assert!(p.position.x.abs() <= 1.0 + 1e-5 && p.position.z.abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn particle_dies_at_end_of_life() {
        let mut fx = Fixture::new();
        let mut pool = ParticlePool::new(1);
        fx.spawn(&mut pool, 0);
        assert_eq!(fx.update(&mut pool, 0, 0.5), SlotUpdate::Alive);
        assert_eq!(fx.update(&mut pool, 0, 0.5), SlotUpdate::Died);
        assert!(!pool.get(0).is_active());
        assert_eq!(pool.active_count(), 0);
        assert_eq!(fx.update(&mut pool, 0, 0.5), SlotUpdate::Idle);
    }

    #[test]
    fn kill_check_preempts_keyframe_wrap() {
        let mut fx = Fixture::new();
        fx.chain.add(Box::new(AlphaInfluencer::default()));
        let mut pool = ParticlePool::new(1);
        fx.spawn(&mut pool, 0);
        fx.update(&mut pool, 0, 0.9);
        assert!(pool.get(0).alpha < 0.2);
        // the alpha track would wrap back to 1.0 here
        assert_eq!(fx.update(&mut pool, 0, 0.2), SlotUpdate::Died);
        assert_eq!(pool.get(0).alpha, 0.0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut fx = Fixture::new();
        let mut pool = ParticlePool::new(2);
        fx.spawn(&mut pool, 0);
        fx.spawn(&mut pool, 1);
        assert!(fx.reset(&mut pool, 0));
        assert!(!fx.reset(&mut pool, 0));
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.iter_active().count(), 1);
    }

    #[derive(Debug, Default)]
    struct Killer {
        after: f32,
    }

    impl Influencer for Killer {
        fn name(&self) -> &'static str {
            "killer"
        }
        fn is_enabled(&self) -> bool {
            true
        }
        fn set_enabled(&mut self, _enabled: bool) {}
        fn initialize(&mut self, _particle: &mut Particle, _ctx: &mut InfluencerContext) {}
        fn update(&mut self, particle: &mut Particle, _dt: f32, _ctx: &mut InfluencerContext) {
            if particle.age >= self.after {
                particle.kill();
            }
        }
        fn duplicate(&self) -> Box<dyn Influencer> {
            Box::new(Killer { after: self.after })
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn influencer_kill_frees_the_slot() {
        let mut fx = Fixture::new();
        fx.chain.add(Box::new(Killer { after: 0.3 }));
        let mut pool = ParticlePool::new(1);
        fx.spawn(&mut pool, 0);
        assert_eq!(fx.update(&mut pool, 0, 0.2), SlotUpdate::Alive);
        assert_eq!(fx.update(&mut pool, 0, 0.2), SlotUpdate::Died);
        assert_eq!(pool.active_count(), 0);
        assert!(!pool.get(0).is_kill_requested());
    }

    #[test]
    fn free_slot_scan_wraps() {
        let mut fx = Fixture::new();
        let mut pool = ParticlePool::new(4);
        for i in [0, 2, 3] {
            fx.spawn(&mut pool, i);
        }
        assert_eq!(pool.find_free_after(2), Some(1));
        fx.spawn(&mut pool, 1);
        assert_eq!(pool.find_free_after(1), None);
    }

    #[test]
    #[should_panic]
    fn out_of_range_slot_panics() {
        let mut fx = Fixture::new();
        let mut pool = ParticlePool::new(2);
        fx.spawn(&mut pool, 5);
    }
}
