use std::rc::Rc;

use glam::Vec2;

use crate::api::host::{HostTransform, MaterialLoader, TextureInfo};
use crate::components::emitter::{
    check_duration, check_range, check_rate, check_sprite_layout, BillboardMode, EmissionPoint, EmitterConfig,
};
use crate::components::mesh::{TriMesh, TriangleMesh};
use crate::components::particle::Particle;
use crate::components::shape::{DirectionMode, EmitterShape};
use crate::core::error::{ConfigError, HostError};
use crate::core::rng::ParticleRng;
use crate::influencers::{EmitterEnv, EmitterView, Influencer, InfluencerChain, InfluencerId};
use crate::renderer::instance::{InstanceBuffer, PackParams, ParticleInstance};
use crate::systems::pool::{ParticlePool, SlotUpdate};
use crate::systems::scheduler::EmissionScheduler;

const DEFAULT_SEED: u64 = 42;

/// A particle emitter: owns the pool, the emission shape, the influencer
/// chain and the emission clock, and drives them once per frame.
///
/// The emitter starts uninitialized and initializes itself on the first
/// enabled `update`, loading its texture through the attached
/// [`MaterialLoader`]. If that fails it logs and disables itself.
///
/// Positions are integrated here (`position += velocity * dt`) after the
/// influencer chain has run for a particle, unless static particles are on.
#[derive(Debug)]
pub struct ParticleEmitter {
    config: EmitterConfig,
    enabled: bool,
    initialized: bool,
    requires_update: bool,
    seed: u64,
    rng: ParticleRng,
    pool: ParticlePool,
    scheduler: EmissionScheduler,
    shape: EmitterShape,
    chain: InfluencerChain,
    transform: HostTransform,
    loader: Option<Rc<dyn MaterialLoader>>,
    texture: Option<TextureInfo>,
    instances: InstanceBuffer,
}

impl Default for ParticleEmitter {
    fn default() -> Self {
        Self::build(EmitterConfig::default())
    }
}

impl ParticleEmitter {
    /// Emitter over a unit quad facing +Y.
    pub fn new(config: EmitterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EmitterConfig) -> Self {
        let mut shape = EmitterShape::new(Rc::new(TriMesh::quad(1.0, 1.0)));
        shape.set_sequential(config.sequential_emission_face, config.sequential_skip_pattern);
        Self {
            enabled: true,
            initialized: false,
            requires_update: true,
            seed: DEFAULT_SEED,
            rng: ParticleRng::new(DEFAULT_SEED),
            pool: ParticlePool::new(config.max_particles),
            scheduler: EmissionScheduler::new(),
            shape,
            chain: InfluencerChain::new(),
            transform: HostTransform::default(),
            loader: None,
            texture: None,
            instances: InstanceBuffer::default(),
            config,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = ParticleRng::new(seed);
        self
    }

    pub fn with_shape(mut self, mesh: Rc<dyn TriangleMesh>) -> Self {
        self.set_shape(mesh);
        self
    }

    pub fn with_loader(mut self, loader: Rc<dyn MaterialLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_influencer(mut self, influencer: Box<dyn Influencer>) -> Self {
        self.chain.add(influencer);
        self
    }

    // -- State --

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Set by configuration changes the render hookup must pick up.
    pub fn requires_update(&self) -> bool {
        self.requires_update
    }

    /// Read and clear the render dirty flag.
    pub fn take_requires_update(&mut self) -> bool {
        std::mem::take(&mut self.requires_update)
    }

    pub fn active_particle_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Every pool slot, live or not.
    pub fn particles(&self) -> &[Particle] {
        self.pool.particles()
    }

    /// Panics if `index` is out of range.
    pub fn particle(&self, index: usize) -> &Particle {
        self.pool.get(index)
    }

    pub fn scheduler(&self) -> &EmissionScheduler {
        &self.scheduler
    }

    pub fn texture(&self) -> Option<TextureInfo> {
        self.texture
    }

    /// Pixel size of one sprite-sheet cell, once the texture is loaded.
    pub fn sprite_cell_size(&self) -> Option<Vec2> {
        self.texture.map(|t| {
            Vec2::new(
                t.width as f32 / self.config.sprite_cols as f32,
                t.height as f32 / self.config.sprite_rows as f32,
            )
        })
    }

    /// Render instances for the live particles, packed after the last update.
    pub fn instances(&self) -> &[ParticleInstance] {
        self.instances.instances()
    }

    pub fn instance_bytes(&self) -> &[u8] {
        self.instances.as_bytes()
    }

    // -- Host hookup --

    pub fn shape(&self) -> &EmitterShape {
        &self.shape
    }

    pub fn set_shape(&mut self, mesh: Rc<dyn TriangleMesh>) {
        self.shape.set_shape(mesh);
        self.requires_update = true;
    }

    pub fn transform(&self) -> HostTransform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: HostTransform) {
        self.transform = transform;
        self.shape.set_transform(transform.rotation, transform.scale);
    }

    pub fn set_loader(&mut self, loader: Rc<dyn MaterialLoader>) {
        self.loader = Some(loader);
    }

    // -- Configuration --

    pub fn set_emissions_per_second(&mut self, rate: f32) -> Result<(), ConfigError> {
        check_rate(rate)?;
        self.config.emissions_per_second = rate;
        Ok(())
    }

    pub fn set_particles_per_emission(&mut self, count: u32) -> Result<(), ConfigError> {
        if count == 0 {
            return Err(ConfigError::InvalidParticlesPerEmission);
        }
        self.config.particles_per_emission = count;
        Ok(())
    }

    /// Resize the pool. Kills every live particle and reallocates.
    pub fn set_max_particles(&mut self, max: usize) -> Result<(), ConfigError> {
        if max == 0 {
            return Err(ConfigError::InvalidMaxParticles);
        }
        self.kill_all_particles();
        self.config.max_particles = max;
        self.pool = ParticlePool::new(max);
        self.scheduler.rewind_slots();
        if self.initialized {
            self.instances = InstanceBuffer::with_capacity(max);
        }
        self.requires_update = true;
        log::debug!("particle pool reallocated with {max} slots");
        Ok(())
    }

    pub fn set_life(&mut self, min: f32, max: f32) -> Result<(), ConfigError> {
        check_range("life", min, max)?;
        self.config.life_min = min;
        self.config.life_max = max;
        Ok(())
    }

    pub fn set_force(&mut self, min: f32, max: f32) -> Result<(), ConfigError> {
        check_range("force", min, max)?;
        self.config.force_min = min;
        self.config.force_max = max;
        Ok(())
    }

    pub fn set_emission_point(&mut self, point: EmissionPoint) {
        self.config.emission_point = point;
    }

    pub fn set_direction_mode(&mut self, direction: DirectionMode) {
        self.config.direction = direction;
    }

    pub fn set_sequential_emission_face(&mut self, sequential: bool, skip_pattern: bool) {
        self.config.sequential_emission_face = sequential;
        self.config.sequential_skip_pattern = skip_pattern;
        self.shape.set_sequential(sequential, skip_pattern);
    }

    pub fn set_start_delay(&mut self, delay: f32) -> Result<(), ConfigError> {
        check_duration("start_delay", delay)?;
        self.config.start_delay = delay;
        Ok(())
    }

    pub fn set_emitter_life(&mut self, life: f32) -> Result<(), ConfigError> {
        check_duration("emitter_life", life)?;
        self.config.emitter_life = life;
        Ok(())
    }

    pub fn set_static_particles(&mut self, frozen: bool) {
        self.config.static_particles = frozen;
    }

    pub fn set_billboard_mode(&mut self, mode: BillboardMode) {
        self.config.billboard = mode;
        self.requires_update = true;
    }

    pub fn set_velocity_stretching(&mut self, enabled: bool, factor: f32) -> Result<(), ConfigError> {
        check_duration("velocity_stretch_factor", factor)?;
        self.config.use_velocity_stretching = enabled;
        self.config.velocity_stretch_factor = factor;
        self.requires_update = true;
        Ok(())
    }

    pub fn set_sprite_layout(&mut self, cols: u32, rows: u32) -> Result<(), ConfigError> {
        check_sprite_layout(cols, rows)?;
        self.config.sprite_cols = cols;
        self.config.sprite_rows = rows;
        self.requires_update = true;
        Ok(())
    }

    /// Change the texture. Reloaded right away if the emitter is initialized.
    pub fn set_texture(&mut self, path: impl Into<String>) {
        self.config.texture = path.into();
        self.requires_update = true;
        if self.initialized {
            match self.load_texture() {
                Ok(texture) => self.texture = Some(texture),
                Err(err) => {
                    log::error!("particle emitter disabled, texture reload failed: {err}");
                    self.enabled = false;
                }
            }
        }
    }

    // -- Influencers --

    pub fn influencers(&self) -> &InfluencerChain {
        &self.chain
    }

    pub fn influencers_mut(&mut self) -> &mut InfluencerChain {
        &mut self.chain
    }

    pub fn add_influencer(&mut self, influencer: Box<dyn Influencer>) -> InfluencerId {
        self.chain.add(influencer)
    }

    /// Remove an influencer, and any influencer it registered, and drop their
    /// per-particle state.
    pub fn remove_influencer(&mut self, id: InfluencerId) -> Option<Box<dyn Influencer>> {
        let mut gone = self.chain.dependents_of(id);
        let removed = self.chain.remove(id)?;
        gone.push(id);
        for index in 0..self.pool.capacity() {
            let particle = self.pool.get_mut(index);
            for &dropped in &gone {
                particle.remove_aux(dropped);
            }
        }
        Some(removed)
    }

    // -- Frame driving --

    /// Advance the emitter by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if !self.enabled {
            self.scheduler.pause();
            return;
        }
        if !self.initialized && !self.initialize() {
            return;
        }
        self.scheduler.advance_clock(dt);

        let view = self.view();
        let Self {
            pool,
            chain,
            shape,
            rng,
            scheduler,
            config,
            ..
        } = self;
        let mut env = EmitterEnv { rng, shape, view };

        for index in 0..pool.capacity() {
            match pool.update_slot(index, dt, chain, &mut env) {
                SlotUpdate::Idle => {}
                SlotUpdate::Died => scheduler.slot_freed(index),
                SlotUpdate::Alive => {
                    if !config.static_particles {
                        let particle = pool.get_mut(index);
                        particle.position += particle.velocity * dt;
                    }
                }
            }
        }

        let count = scheduler.take_emissions(dt, config);
        for _ in 0..count {
            if !spawn_one(pool, scheduler, chain, config, &mut env) {
                break;
            }
        }

        self.pack_instances();
    }

    /// Spawn up to `count` particles now. Returns how many were spawned.
    pub fn emit_particles(&mut self, count: usize) -> usize {
        let view = self.view();
        let Self {
            pool,
            chain,
            shape,
            rng,
            scheduler,
            config,
            ..
        } = self;
        let mut env = EmitterEnv { rng, shape, view };
        let mut spawned = 0;
        while spawned < count && spawn_one(pool, scheduler, chain, config, &mut env) {
            spawned += 1;
        }
        self.pack_instances();
        spawned
    }

    /// Fill every free slot now.
    pub fn emit_all_particles(&mut self) -> usize {
        let free = self.pool.capacity() - self.pool.active_count();
        self.emit_particles(free)
    }

    /// Kill the particle in slot `index`. Returns false if it was not live.
    /// Panics if `index` is out of range.
    pub fn kill_particle(&mut self, index: usize) -> bool {
        let view = self.view();
        let Self {
            pool,
            chain,
            shape,
            rng,
            scheduler,
            ..
        } = self;
        let mut env = EmitterEnv { rng, shape, view };
        let killed = pool.reset_slot(index, chain, &mut env);
        if killed {
            scheduler.slot_freed(index);
            self.pack_instances();
        }
        killed
    }

    pub fn kill_all_particles(&mut self) {
        let view = self.view();
        let Self {
            pool,
            chain,
            shape,
            rng,
            scheduler,
            ..
        } = self;
        let mut env = EmitterEnv { rng, shape, view };
        for index in 0..pool.capacity() {
            if pool.reset_slot(index, chain, &mut env) {
                scheduler.slot_freed(index);
            }
        }
        self.pack_instances();
    }

    /// Kill everything and restart the emission clock, so start delay and
    /// emitter life count from now.
    pub fn reset(&mut self) {
        self.kill_all_particles();
        self.scheduler.restart();
        self.scheduler.rewind_slots();
    }

    /// Same configuration, shape, influencers and host handles; empty pool
    /// and fresh runtime state.
    pub fn duplicate(&self) -> Self {
        let mut shape = EmitterShape::new(Rc::clone(self.shape.mesh()));
        shape.set_sequential(self.config.sequential_emission_face, self.config.sequential_skip_pattern);
        shape.set_transform(self.transform.rotation, self.transform.scale);
        Self {
            config: self.config.clone(),
            enabled: self.enabled,
            initialized: false,
            requires_update: true,
            seed: self.seed,
            rng: ParticleRng::new(self.seed),
            pool: ParticlePool::new(self.config.max_particles),
            scheduler: EmissionScheduler::new(),
            shape,
            chain: self.chain.duplicate(),
            transform: self.transform,
            loader: self.loader.clone(),
            texture: None,
            instances: InstanceBuffer::default(),
        }
    }

    fn view(&self) -> EmitterView {
        EmitterView {
            static_particles: self.config.static_particles,
            random_emission_point: self.config.emission_point == EmissionPoint::RandomPoint,
            sprite_cols: self.config.sprite_cols,
            sprite_rows: self.config.sprite_rows,
            translation: self.transform.translation,
        }
    }

    fn load_texture(&self) -> Result<TextureInfo, HostError> {
        let loader = self.loader.as_ref().ok_or(HostError::LoaderUnavailable)?;
        loader.load_texture(&self.config.texture)
    }

    /// Lazy one-way initialization. Disables the emitter on failure.
    fn initialize(&mut self) -> bool {
        match self.load_texture() {
            Ok(texture) => {
                self.texture = Some(texture);
                self.instances = InstanceBuffer::with_capacity(self.config.max_particles);
                self.initialized = true;
                self.requires_update = true;
                log::info!(
                    "particle emitter initialized: {} slots, texture {} ({}x{})",
                    self.config.max_particles,
                    self.config.texture,
                    texture.width,
                    texture.height
                );
                true
            }
            Err(err) => {
                log::error!("particle emitter disabled, initialization failed: {err}");
                self.enabled = false;
                false
            }
        }
    }

    fn pack_instances(&mut self) {
        if !self.initialized {
            return;
        }
        let params = PackParams {
            translation: self.transform.translation,
            sprite_cols: self.config.sprite_cols,
            sprite_rows: self.config.sprite_rows,
            billboard: self.config.billboard as u8,
            stretch_factor: self
                .config
                .use_velocity_stretching
                .then_some(self.config.velocity_stretch_factor),
        };
        self.instances.clear();
        for particle in self.pool.iter_active() {
            self.instances.push(ParticleInstance::pack(particle, &params));
        }
    }
}

/// Spawn one particle into the scheduler's next free slot. False when the pool is full.
fn spawn_one(
    pool: &mut ParticlePool,
    scheduler: &mut EmissionScheduler,
    chain: &mut InfluencerChain,
    config: &EmitterConfig,
    env: &mut EmitterEnv,
) -> bool {
    let Some(index) = scheduler.claim_slot(pool) else {
        return false;
    };
    pool.initialize_slot(index, config, chain, env);
    scheduler.slot_filled(index, pool);
    true
}
