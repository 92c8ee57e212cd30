use std::any::Any;

use serde::{Deserialize, Serialize};

use super::keyframes::{KeyframeCursor, KeyframeTrack};
use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;
use crate::extensions::easing::Easing;

/// Keyframed opacity over a particle's life. Fades 1 → 0 unless configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub alphas: KeyframeTrack<f32>,
}

impl Default for AlphaInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            alphas: KeyframeTrack::default(),
        }
    }
}

impl AlphaInfluencer {
    pub fn new(alphas: KeyframeTrack<f32>) -> Self {
        Self {
            enabled: true,
            alphas,
        }
    }

    pub fn add_alpha(&mut self, alpha: f32, curve: Easing) {
        self.alphas.push(alpha, curve);
    }
}

impl Influencer for AlphaInfluencer {
    fn name(&self) -> &'static str {
        "alpha"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn first_initialize(&mut self) {
        if !self
            .alphas
            .ensure_defaults(&[(1.0, Easing::Linear), (0.0, Easing::Linear)])
        {
            log::warn!("alpha influencer needs at least two keyframes; disabling");
            self.enabled = false;
        }
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        if self.alphas.is_empty() {
            return;
        }
        let cursor = self.alphas.start(particle.start_life, ctx.rng);
        particle.alpha = self.alphas.keys[cursor.index].value;
        *particle.aux_mut::<KeyframeCursor>(ctx.id) = cursor;
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if self.alphas.is_empty() {
            return;
        }
        let cursor = particle.aux_mut::<KeyframeCursor>(ctx.id);
        self.alphas.advance(cursor, dt);
        let alpha = self.alphas.value_at(cursor);
        particle.alpha = alpha;
    }

    fn reset(&mut self, particle: &mut Particle, _ctx: &mut InfluencerContext) {
        particle.alpha = 0.0;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Alpha(self.clone()))
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
