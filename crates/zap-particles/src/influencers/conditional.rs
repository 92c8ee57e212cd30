use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::{Influencer, InfluencerContext, InfluencerId};
use crate::components::particle::Particle;

/// Gate evaluated every frame: `(particle, per-particle state, dt) -> run target?`
pub type Condition<S> = Rc<dyn Fn(&Particle, &mut S, f32) -> bool>;

/// Runs another influencer only while a condition holds.
///
/// On first use the wrapped influencer is handed to the chain, inserted
/// right after the wrapper and disabled. The wrapper enables it for every
/// spawn so its per-particle state is always initialized, then toggles it
/// from the condition each frame before it runs.
///
/// `S` is per-particle condition state, reset to `S::default()` on spawn.
pub struct ConditionalInfluencer<S: Default + 'static = ()> {
    enabled: bool,
    target: Option<Box<dyn Influencer>>,
    target_id: Option<InfluencerId>,
    condition: Condition<S>,
}

impl<S: Default + 'static> ConditionalInfluencer<S> {
    pub fn new(target: Box<dyn Influencer>, condition: impl Fn(&Particle, &mut S, f32) -> bool + 'static) -> Self {
        Self {
            enabled: true,
            target: Some(target),
            target_id: None,
            condition: Rc::new(condition),
        }
    }

    /// Chain id of the wrapped influencer once it has been registered.
    pub fn target_id(&self) -> Option<InfluencerId> {
        self.target_id
    }

    fn ensure_registered(&mut self, ctx: &mut InfluencerContext) -> Option<InfluencerId> {
        if let Some(target) = self.target.take() {
            log::debug!("conditional influencer {:?}: registering {}", ctx.id, target.name());
            self.target_id = Some(ctx.register(target));
        }
        self.target_id
    }
}

impl<S: Default + 'static> fmt::Debug for ConditionalInfluencer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalInfluencer")
            .field("enabled", &self.enabled)
            .field("target", &self.target)
            .field("target_id", &self.target_id)
            .finish_non_exhaustive()
    }
}

impl<S: Default + 'static> Influencer for ConditionalInfluencer<S> {
    fn name(&self) -> &'static str {
        "conditional"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        particle.reset_aux::<S>(ctx.id);
        if let Some(target) = self.ensure_registered(ctx) {
            ctx.set_enabled(target, true);
        }
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        let Some(target) = self.ensure_registered(ctx) else {
            return;
        };
        let mut state = std::mem::take(particle.aux_mut::<S>(ctx.id));
        let active = (self.condition)(particle, &mut state, dt);
        *particle.aux_mut::<S>(ctx.id) = state;
        ctx.set_enabled(target, active);
    }

    /// The wrapped influencer lives in the chain once registered and is
    /// duplicated with it under the same id.
    fn duplicate(&self) -> Box<dyn Influencer> {
        Box::new(Self {
            enabled: self.enabled,
            target: self.target.as_ref().map(|t| t.duplicate()),
            target_id: self.target_id,
            condition: Rc::clone(&self.condition),
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
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::components::mesh::TriMesh;
    use crate::components::shape::EmitterShape;
    use crate::core::rng::ParticleRng;
    use crate::influencers::{EmitterEnv, EmitterView, GravityInfluencer, InfluencerChain};

    fn env_parts() -> (ParticleRng, EmitterShape) {
        (ParticleRng::new(5), EmitterShape::new(Rc::new(TriMesh::quad(1.0, 1.0))))
    }

    #[test]
    fn registers_target_after_itself() {
        let (mut rng, mut shape) = env_parts();
        let mut env = EmitterEnv {
            rng: &mut rng,
            shape: &mut shape,
            view: EmitterView::default(),
        };
        let mut chain = InfluencerChain::new();
        let wrapper = chain.add(Box::new(ConditionalInfluencer::<()>::new(
            Box::new(GravityInfluencer::default()),
            |_, _, _| true,
        )));
        assert_eq!(chain.len(), 1);

        let mut p = Particle::new(0);
        chain.initialize(&mut p, &mut env);
        let ids = chain.ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], wrapper);
        assert!(chain.by_id(ids[1]).unwrap().is_enabled());
        assert_eq!(
            chain.get::<ConditionalInfluencer<()>>().unwrap().target_id(),
            Some(ids[1])
        );
        assert!(chain.describe().is_empty());
    }

    #[test]
    fn gates_target_per_frame() {
        let (mut rng, mut shape) = env_parts();
        let mut env = EmitterEnv {
            rng: &mut rng,
            shape: &mut shape,
            view: EmitterView::default(),
        };
        let mut chain = InfluencerChain::new();
        // gravity only while moving upward
        chain.add(Box::new(ConditionalInfluencer::<()>::new(
            Box::new(GravityInfluencer::new(Vec3::new(0.0, 10.0, 0.0))),
            |p, _, _| p.velocity.y > 0.0,
        )));

        let mut p = Particle::new(0);
        p.velocity = Vec3::new(0.0, 1.0, 0.0);
        chain.initialize(&mut p, &mut env);
        chain.update(&mut p, 0.05, &mut env);
        assert!((p.velocity.y - 0.5).abs() < 1e-5);
        chain.update(&mut p, 0.1, &mut env);
        assert!((p.velocity.y + 0.5).abs() < 1e-5);
        chain.update(&mut p, 0.1, &mut env);
        assert!((p.velocity.y + 0.5).abs() < 1e-5);
    }

    #[test]
    fn condition_state_is_per_particle_and_reset_on_spawn() {
        let (mut rng, mut shape) = env_parts();
        let mut env = EmitterEnv {
            rng: &mut rng,
            shape: &mut shape,
            view: EmitterView::default(),
        };
        let mut chain = InfluencerChain::new();
        // run the target for the first 0.2s of each particle's life only
        chain.add(Box::new(ConditionalInfluencer::<f32>::new(
            Box::new(GravityInfluencer::default()),
            |_, elapsed, dt| {
                *elapsed += dt;
                *elapsed <= 0.2
            },
        )));

        let mut a = Particle::new(0);
        let mut b = Particle::new(1);
        chain.initialize(&mut a, &mut env);
        for _ in 0..3 {
            chain.update(&mut a, 0.1, &mut env);
        }
        assert!((a.velocity.y + 0.2).abs() < 1e-5);

        chain.initialize(&mut b, &mut env);
        chain.update(&mut b, 0.1, &mut env);
        assert!((b.velocity.y + 0.1).abs() < 1e-5);
    }

    #[test]
    fn removing_the_wrapper_removes_its_target() {
        let (mut rng, mut shape) = env_parts();
        let mut env = EmitterEnv {
            rng: &mut rng,
            shape: &mut shape,
            view: EmitterView::default(),
        };
        let mut chain = InfluencerChain::new();
        let wrapper = chain.add(Box::new(ConditionalInfluencer::<()>::new(
            Box::new(GravityInfluencer::default()),
            |_, _, _| true,
        )));
        let kept = chain.add(Box::new(GravityInfluencer::default()));

        let mut p = Particle::new(0);
        chain.initialize(&mut p, &mut env);
        let target = chain
            .get::<ConditionalInfluencer<()>>()
            .and_then(|c| c.target_id())
            .unwrap();
        assert_eq!(chain.dependents_of(wrapper), vec![target]);

        assert!(chain.remove(wrapper).is_some());
        assert_eq!(chain.ids(), vec![kept]);
        assert!(chain.by_id(target).is_none());
    }
}
