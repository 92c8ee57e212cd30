use std::any::Any;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use super::keyframes::{KeyframeCursor, KeyframeTrack};
use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::particle::Particle;
use crate::extensions::easing::Easing;

const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
const YELLOW: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);

/// Keyframed RGBA color over a particle's life. Red → yellow unless configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub colors: KeyframeTrack<Vec4>,
}

impl Default for ColorInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            colors: KeyframeTrack::default(),
        }
    }
}

impl ColorInfluencer {
    pub fn new(colors: KeyframeTrack<Vec4>) -> Self {
        Self {
            enabled: true,
            colors,
        }
    }

    pub fn add_color(&mut self, color: Vec4, curve: Easing) {
        self.colors.push(color, curve);
    }
}

impl Influencer for ColorInfluencer {
    fn name(&self) -> &'static str {
        "color"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn first_initialize(&mut self) {
        if !self
            .colors
            .ensure_defaults(&[(RED, Easing::Linear), (YELLOW, Easing::Linear)])
        {
            log::warn!("color influencer needs at least two keyframes; disabling");
            self.enabled = false;
        }
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        if self.colors.is_empty() {
            return;
        }
        let cursor = self.colors.start(particle.start_life, ctx.rng);
        particle.color = self.colors.keys[cursor.index].value;
        *particle.aux_mut::<KeyframeCursor>(ctx.id) = cursor;
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if self.colors.is_empty() {
            return;
        }
        let cursor = particle.aux_mut::<KeyframeCursor>(ctx.id);
        self.colors.advance(cursor, dt);
        let color = self.colors.value_at(cursor);
        particle.color = color;
    }

    fn reset(&mut self, particle: &mut Particle, _ctx: &mut InfluencerContext) {
        particle.color = Vec4::ZERO;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Color(self.clone()))
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
