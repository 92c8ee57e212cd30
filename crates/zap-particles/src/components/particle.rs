//! Particle record: one slot of the fixed pool.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use glam::{Vec3, Vec4};

use crate::influencers::InfluencerId;

/// One slot in the particle pool.
///
/// A record is either fully reset (`is_active() == false`, transient state
/// zeroed) or fully initialized. Influencer-private state lives in typed
/// auxiliary slots keyed by [`InfluencerId`]; the slots survive slot reuse so
/// respawning does not reallocate, and influencers overwrite them on respawn.
#[derive(Debug)]
pub struct Particle {
    index: usize,
    pub(crate) active: bool,
    pub(crate) kill_requested: bool,

    /// Position in emitter space (emitter translation not applied).
    pub position: Vec3,
    pub velocity: Vec3,
    /// Pull captured at spawn by reverse-velocity gravity.
    pub reverse_velocity: Vec3,
    /// Euler angles in radians.
    pub angles: Vec3,
    /// Angular velocity per axis, radians per second.
    pub rotation_speed: Vec3,
    pub size: Vec3,
    pub start_size: Vec3,
    pub end_size: Vec3,

    /// Spawn position (emission point, including the random offset if any).
    pub initial_position: Vec3,
    /// Offset from the emission face center when random emission points are used.
    pub random_offset: Vec3,
    /// Emission face this particle was spawned from.
    pub triangle_index: Option<usize>,

    pub age: f32,
    pub start_life: f32,
    /// Magnitude of the initial velocity.
    pub initial_length: f32,

    pub color: Vec4,
    pub alpha: f32,
    pub sprite_col: u32,
    pub sprite_row: u32,

    aux: HashMap<InfluencerId, Box<dyn Any>>,
    /// Influencers whose spawn hook has run for the current life.
    initialized_by: HashSet<InfluencerId>,
}

impl Particle {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            active: false,
            kill_requested: false,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            reverse_velocity: Vec3::ZERO,
            angles: Vec3::ZERO,
            rotation_speed: Vec3::ZERO,
            size: Vec3::ZERO,
            start_size: Vec3::ZERO,
            end_size: Vec3::ZERO,
            initial_position: Vec3::ZERO,
            random_offset: Vec3::ZERO,
            triangle_index: None,
            age: 0.0,
            start_life: 0.0,
            initial_length: 0.0,
            color: Vec4::ZERO,
            alpha: 0.0,
            sprite_col: 0,
            sprite_row: 0,
            aux: HashMap::new(),
            initialized_by: HashSet::new(),
        }
    }

    /// Slot position in the pool.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ask the pool to reset this particle at the end of the current influencer.
    /// Later influencers in the chain are skipped for this frame.
    pub fn kill(&mut self) {
        self.kill_requested = true;
    }

    #[inline]
    pub fn is_kill_requested(&self) -> bool {
        self.kill_requested
    }

    /// Normalized age in [0, 1].
    pub fn age_ratio(&self) -> f32 {
        if self.start_life <= 0.0 {
            1.0
        } else {
            (self.age / self.start_life).min(1.0)
        }
    }

    /// Zero every transient field. Auxiliary slots are kept for reuse.
    pub(crate) fn clear(&mut self) {
        self.active = false;
        self.kill_requested = false;
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.reverse_velocity = Vec3::ZERO;
        self.angles = Vec3::ZERO;
        self.rotation_speed = Vec3::ZERO;
        self.size = Vec3::ZERO;
        self.start_size = Vec3::ZERO;
        self.end_size = Vec3::ZERO;
        self.initial_position = Vec3::ZERO;
        self.random_offset = Vec3::ZERO;
        self.triangle_index = None;
        self.age = 0.0;
        self.start_life = 0.0;
        self.initial_length = 0.0;
        self.color = Vec4::ZERO;
        self.alpha = 0.0;
        self.sprite_col = 0;
        self.sprite_row = 0;
        self.initialized_by.clear();
    }

    /// Auxiliary state for influencer `id`, created with `T::default()` on first use.
    ///
    /// Panics if the slot already holds a different type, which means two
    /// influencers share an id.
    pub fn aux_mut<T: Default + 'static>(&mut self, id: InfluencerId) -> &mut T {
        let slot = self
            .aux
            .entry(id)
            .or_insert_with(|| Box::new(T::default()) as Box<dyn Any>);
        match slot.downcast_mut::<T>() {
            Some(state) => state,
            None => panic!("auxiliary state type mismatch for influencer {id:?}"),
        }
    }

    /// Auxiliary state for influencer `id` reset to `T::default()`, reusing the allocation.
    pub fn reset_aux<T: Default + 'static>(&mut self, id: InfluencerId) -> &mut T {
        let state = self.aux_mut::<T>(id);
        *state = T::default();
        state
    }

    pub fn aux<T: 'static>(&self, id: InfluencerId) -> Option<&T> {
        self.aux.get(&id).and_then(|slot| slot.downcast_ref::<T>())
    }

    /// Drop auxiliary state of an influencer that left the chain.
    pub(crate) fn remove_aux(&mut self, id: InfluencerId) {
        self.aux.remove(&id);
        self.initialized_by.remove(&id);
    }

    pub(crate) fn mark_initialized(&mut self, id: InfluencerId) {
        self.initialized_by.insert(id);
    }

    /// Whether influencer `id` ran its spawn hook for this particle's current life.
    pub fn is_initialized_by(&self, id: InfluencerId) -> bool {
        self.initialized_by.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Counter {
        hits: u32,
    }

    #[test]
    fn new_particle_is_inactive() {
        let p = Particle::new(3);
        assert_eq!(p.index(), 3);
        assert!(!p.is_active());
        assert_eq!(p.age_ratio(), 1.0);
    }

    #[test]
    fn aux_created_lazily_and_persists() {
        let mut p = Particle::new(0);
        let id = InfluencerId(7);
        assert!(p.aux::<Counter>(id).is_none());
        p.aux_mut::<Counter>(id).hits += 1;
        p.aux_mut::<Counter>(id).hits += 1;
        assert_eq!(p.aux::<Counter>(id), Some(&Counter { hits: 2 }));

        p.clear();
        assert_eq!(p.aux::<Counter>(id).map(|c| c.hits), Some(2));
        assert_eq!(p.reset_aux::<Counter>(id).hits, 0);
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn aux_type_mismatch_panics() {
        let mut p = Particle::new(0);
        let id = InfluencerId(1);
        p.aux_mut::<Counter>(id);
        p.aux_mut::<f32>(id);
    }

    #[test]
    fn clear_zeroes_transient_state() {
        let mut p = Particle::new(0);
        p.active = true;
        p.velocity = Vec3::ONE;
        p.color = Vec4::ONE;
        p.sprite_col = 3;
        p.triangle_index = Some(2);
        p.mark_initialized(InfluencerId(4));
        p.kill();
        p.clear();
        assert!(!p.is_active());
        assert!(!p.is_kill_requested());
        assert_eq!(p.velocity, Vec3::ZERO);
        assert_eq!(p.color, Vec4::ZERO);
        assert_eq!(p.sprite_col, 0);
        assert_eq!(p.triangle_index, None);
        assert!(!p.is_initialized_by(InfluencerId(4)));
    }
}
