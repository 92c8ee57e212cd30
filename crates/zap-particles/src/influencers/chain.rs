//! Ordered influencer list owned by one emitter.

use super::{ChainOps, EmitterEnv, Influencer, InfluencerContext, InfluencerDesc, InfluencerId};
use crate::components::particle::Particle;

#[derive(Debug)]
struct Entry {
    id: InfluencerId,
    influencer: Box<dyn Influencer>,
    /// Whether `first_initialize` has run for this instance.
    prepared: bool,
    /// The influencer that registered this one and owns its configuration.
    owner: Option<InfluencerId>,
}

impl Entry {
    /// Run `first_initialize` once. Returns whether the influencer is still enabled.
    fn prepare(&mut self) -> bool {
        if !self.prepared {
            self.influencer.first_initialize();
            self.prepared = true;
        }
        self.influencer.is_enabled()
    }
}

/// Ordered influencers applied to every particle.
///
/// Influencers may register new influencers and toggle others through their
/// [`InfluencerContext`]; the chain applies those requests as soon as the
/// requesting call returns, so they affect the rest of the same pass.
#[derive(Debug, Default)]
pub struct InfluencerChain {
    entries: Vec<Entry>,
    ops: ChainOps,
}

impl InfluencerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an influencer. Returns its id.
    pub fn add(&mut self, influencer: Box<dyn Influencer>) -> InfluencerId {
        let id = self.ops.reserve_id();
        self.entries.push(Entry {
            id,
            influencer,
            prepared: false,
            owner: None,
        });
        log::debug!("influencer chain: added {id:?}");
        id
    }

    /// Append a default `T` unless one is already in the chain. Returns the id of the
    /// existing or new instance.
    pub fn add_unique<T: Influencer + Default>(&mut self) -> InfluencerId {
        match self.id_of::<T>() {
            Some(id) => id,
            None => self.add(Box::new(T::default())),
        }
    }

    /// Id of the first influencer of type `T`.
    pub fn id_of<T: Influencer>(&self) -> Option<InfluencerId> {
        self.entries
            .iter()
            .find(|e| e.influencer.as_any().is::<T>())
            .map(|e| e.id)
    }

    /// First influencer of type `T`.
    pub fn get<T: Influencer>(&self) -> Option<&T> {
        self.entries
            .iter()
            .find_map(|e| e.influencer.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Influencer>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find_map(|e| e.influencer.as_any_mut().downcast_mut::<T>())
    }

    pub fn by_id(&self, id: InfluencerId) -> Option<&dyn Influencer> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.influencer.as_ref())
    }

    pub fn by_id_mut(&mut self, id: InfluencerId) -> Option<&mut (dyn Influencer + 'static)> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e.influencer.as_mut())
    }

    /// Remove an influencer together with every influencer it registered.
    pub fn remove(&mut self, id: InfluencerId) -> Option<Box<dyn Influencer>> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let dependents = self.dependents_of(id);
        let removed = self.entries.remove(pos).influencer;
        self.entries.retain(|e| !dependents.contains(&e.id));
        Some(removed)
    }

    /// Remove every influencer of type `T` and what they registered. Returns
    /// the ids of the removed `T`s.
    pub fn remove_all<T: Influencer>(&mut self) -> Vec<InfluencerId> {
        let ids: Vec<InfluencerId> = self
            .entries
            .iter()
            .filter(|e| e.influencer.as_any().is::<T>())
            .map(|e| e.id)
            .collect();
        for &id in &ids {
            self.remove(id);
        }
        ids
    }

    /// Ids registered by `id`, directly or through another registered influencer.
    pub fn dependents_of(&self, id: InfluencerId) -> Vec<InfluencerId> {
        let mut found = Vec::new();
        let mut pending = vec![id];
        while let Some(owner) = pending.pop() {
            for e in self.entries.iter().filter(|e| e.owner == Some(owner)) {
                found.push(e.id);
                pending.push(e.id);
            }
        }
        found
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<InfluencerId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InfluencerId, &dyn Influencer)> {
        self.entries.iter().map(|e| (e.id, e.influencer.as_ref()))
    }

    /// Persistable configurations, in chain order. Runtime-only influencers and
    /// the influencers they registered are skipped.
    pub fn describe(&self) -> Vec<InfluencerDesc> {
        self.entries
            .iter()
            .filter(|e| e.owner.is_none())
            .filter_map(|e| e.influencer.describe())
            .collect()
    }

    /// Same influencers under the same ids, with fresh runtime state.
    pub fn duplicate(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| Entry {
                    id: e.id,
                    influencer: e.influencer.duplicate(),
                    prepared: false,
                    owner: e.owner,
                })
                .collect(),
            ops: ChainOps {
                next_id: self.ops.next_id,
                ..ChainOps::default()
            },
        }
    }

    /// Run the spawn hooks of every enabled influencer, in order.
    pub fn initialize(&mut self, particle: &mut Particle, env: &mut EmitterEnv) {
        let mut i = 0;
        while i < self.entries.len() {
            let entry = &mut self.entries[i];
            // first_initialize may disable an influencer that cannot run
            if entry.influencer.is_enabled() && entry.prepare() {
                let mut ctx = InfluencerContext {
                    id: entry.id,
                    rng: &mut *env.rng,
                    shape: &mut *env.shape,
                    emitter: env.view,
                    ops: &mut self.ops,
                };
                entry.influencer.initialize(particle, &mut ctx);
                particle.mark_initialized(entry.id);
            }
            self.apply_ops(i);
            i += 1;
        }
    }

    /// Run the per-frame hooks of every enabled influencer, in order.
    /// Stops early once an influencer asks for the particle to be killed.
    ///
    /// An influencer that joined the chain, or was enabled, after the particle
    /// spawned is initialized for it right before its first update.
    pub fn update(&mut self, particle: &mut Particle, dt: f32, env: &mut EmitterEnv) {
        let mut i = 0;
        while i < self.entries.len() {
            let entry = &mut self.entries[i];
            if entry.influencer.is_enabled() && entry.prepare() {
                let mut ctx = InfluencerContext {
                    id: entry.id,
                    rng: &mut *env.rng,
                    shape: &mut *env.shape,
                    emitter: env.view,
                    ops: &mut self.ops,
                };
                if !particle.is_initialized_by(entry.id) {
                    entry.influencer.initialize(particle, &mut ctx);
                    particle.mark_initialized(entry.id);
                }
                entry.influencer.update(particle, dt, &mut ctx);
            }
            self.apply_ops(i);
            if particle.is_kill_requested() {
                break;
            }
            i += 1;
        }
    }

    /// Run the death hooks of every influencer, enabled or not.
    pub fn reset(&mut self, particle: &mut Particle, env: &mut EmitterEnv) {
        let mut i = 0;
        while i < self.entries.len() {
            let entry = &mut self.entries[i];
            let mut ctx = InfluencerContext {
                id: entry.id,
                rng: &mut *env.rng,
                shape: &mut *env.shape,
                emitter: env.view,
                ops: &mut self.ops,
            };
            entry.influencer.reset(particle, &mut ctx);
            self.apply_ops(i);
            i += 1;
        }
    }

    /// Apply requests made by the influencer at `at`.
    fn apply_ops(&mut self, at: usize) {
        let owner = self.entries[at].id;
        for (offset, (id, mut influencer)) in self.ops.registrations.drain(..).enumerate() {
            influencer.set_enabled(false);
            log::debug!("influencer chain: {id:?} registered at {}", at + 1 + offset);
            self.entries.insert(
                at + 1 + offset,
                Entry {
                    id,
                    influencer,
                    prepared: false,
                    owner: Some(owner),
                },
            );
        }
        for (id, enabled) in self.ops.toggles.drain(..) {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
                entry.influencer.set_enabled(enabled);
            }
        }
    }
}
