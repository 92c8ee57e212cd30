use std::any::Any;

use serde::{Deserialize, Serialize};

use super::{default_enabled, Influencer, InfluencerContext, InfluencerDesc};
use crate::components::emitter::check_step;
use crate::components::particle::Particle;
use crate::core::error::ConfigError;

/// Steps through sprite-sheet cells.
///
/// Walks the sheet column by column then row by row, or follows
/// `frame_sequence` (cell indices in row-major order). Frames advance every
/// `fixed_duration` seconds when cycling, otherwise the animation is spread
/// once across the particle's life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteInfluencer {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_enabled")]
    pub animate: bool,
    #[serde(default)]
    pub random_start_image: bool,
    #[serde(default)]
    pub frame_sequence: Vec<u32>,
    #[serde(default)]
    pub cycle: bool,
    #[serde(default = "default_frame_duration")]
    pub fixed_duration: f32,
}

fn default_frame_duration() -> f32 {
    0.125
}

#[derive(Debug, Clone, Copy, Default)]
struct FrameState {
    sequence_index: usize,
    interval: f32,
    duration: f32,
}

impl Default for SpriteInfluencer {
    fn default() -> Self {
        Self {
            enabled: true,
            animate: true,
            random_start_image: false,
            frame_sequence: Vec::new(),
            cycle: false,
            fixed_duration: default_frame_duration(),
        }
    }
}

impl SpriteInfluencer {
    pub fn with_frame_sequence(mut self, frames: Vec<u32>) -> Self {
        self.frame_sequence = frames;
        self
    }

    pub fn with_cycle(mut self, fixed_duration: f32) -> Self {
        self.cycle = true;
        self.fixed_duration = fixed_duration;
        self
    }

    /// Cycle with a fixed per-frame duration. Rejects non-finite or non-positive durations.
    pub fn set_cycle(&mut self, fixed_duration: f32) -> Result<(), ConfigError> {
        check_step("sprite frame duration", fixed_duration)?;
        self.cycle = true;
        self.fixed_duration = fixed_duration;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_step("sprite frame duration", self.fixed_duration)
    }

    fn frame_count(&self, cols: u32, rows: u32) -> usize {
        if self.frame_sequence.is_empty() {
            (cols * rows) as usize
        } else {
            self.frame_sequence.len()
        }
    }

    fn show_frame(frame: u32, cols: u32, rows: u32, particle: &mut Particle) {
        particle.sprite_col = frame % cols;
        particle.sprite_row = (frame / cols) % rows;
    }

    /// Move `steps` frames forward, wrapping at the end of the sheet or sequence.
    fn skip_frames(&self, state: &mut FrameState, steps: usize, cols: u32, rows: u32, particle: &mut Particle) {
        if self.frame_sequence.is_empty() {
            let cells = (cols * rows) as usize;
            let current = (particle.sprite_row * cols + particle.sprite_col) as usize % cells;
            let next = (current + steps % cells) % cells;
            Self::show_frame(next as u32, cols, rows, particle);
        } else {
            let len = self.frame_sequence.len();
            state.sequence_index = (state.sequence_index + steps % len) % len;
            Self::show_frame(self.frame_sequence[state.sequence_index], cols, rows, particle);
        }
    }
}

impl Influencer for SpriteInfluencer {
    fn name(&self) -> &'static str {
        "sprite"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn initialize(&mut self, particle: &mut Particle, ctx: &mut InfluencerContext) {
        let cols = ctx.emitter.sprite_cols.max(1);
        let rows = ctx.emitter.sprite_rows.max(1);
        let mut state = FrameState::default();

        if self.frame_sequence.is_empty() {
            if self.random_start_image {
                particle.sprite_col = ctx.rng.index(cols as usize) as u32;
                particle.sprite_row = ctx.rng.index(rows as usize) as u32;
            } else {
                particle.sprite_col = 0;
                particle.sprite_row = 0;
            }
        } else {
            if self.random_start_image {
                state.sequence_index = ctx.rng.index(self.frame_sequence.len());
            }
            Self::show_frame(self.frame_sequence[state.sequence_index], cols, rows, particle);
        }

        state.duration = if self.cycle {
            self.fixed_duration
        } else {
            particle.start_life / self.frame_count(cols, rows) as f32
        };
        *particle.aux_mut::<FrameState>(ctx.id) = state;
    }

    fn update(&mut self, particle: &mut Particle, dt: f32, ctx: &mut InfluencerContext) {
        if !self.animate {
            return;
        }
        let cols = ctx.emitter.sprite_cols.max(1);
        let rows = ctx.emitter.sprite_rows.max(1);
        let mut state = *particle.aux_mut::<FrameState>(ctx.id);
        state.interval += dt;
        if state.duration > 0.0 && state.interval >= state.duration {
            let steps = (state.interval / state.duration).floor();
            state.interval = (state.interval - steps * state.duration).clamp(0.0, state.duration);
            self.skip_frames(&mut state, steps as usize, cols, rows, particle);
        }
        *particle.aux_mut::<FrameState>(ctx.id) = state;
    }

    fn describe(&self) -> Option<InfluencerDesc> {
        Some(InfluencerDesc::Sprite(self.clone()))
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
    use glam::Vec3;

    use super::*;
    use crate::influencers::testing::Harness;

    fn sheet(cols: u32, rows: u32) -> Harness {
        let mut h = Harness::new();
        h.view.sprite_cols = cols;
        h.view.sprite_rows = rows;
        h
    }

    #[test]
    fn walks_columns_then_rows_across_life() {
        let mut h = sheet(2, 2);
        let mut sprite = SpriteInfluencer::default();
        let mut p = h.particle(1.0, Vec3::Y);
        h.spawn(&mut sprite, &mut p);
        assert_eq!((p.sprite_col, p.sprite_row), (0, 0));
        h.step(&mut sprite, &mut p, 0.25);
        assert_eq!((p.sprite_col, p.sprite_row), (1, 0));
        h.step(&mut sprite, &mut p, 0.25);
        assert_eq!((p.sprite_col, p.sprite_row), (0, 1));
        h.step(&mut sprite, &mut p, 0.5);
        assert_eq!((p.sprite_col, p.sprite_row), (0, 0));
    }

    #[test]
    fn follows_frame_sequence() {
        let mut h = sheet(4, 2);
        let mut sprite = SpriteInfluencer::default()
            .with_frame_sequence(vec![5, 2, 7])
            .with_cycle(0.1);
        let mut p = h.particle(10.0, Vec3::Y);
        h.spawn(&mut sprite, &mut p);
        assert_eq!((p.sprite_col, p.sprite_row), (1, 1));
        h.step(&mut sprite, &mut p, 0.1);
        assert_eq!((p.sprite_col, p.sprite_row), (2, 0));
        h.step(&mut sprite, &mut p, 0.1);
        assert_eq!((p.sprite_col, p.sprite_row), (3, 1));
    }

    #[test]
    fn random_start_stays_on_the_sheet() {
        let mut h = sheet(3, 2);
        let mut sprite = SpriteInfluencer {
            random_start_image: true,
            animate: false,
            ..SpriteInfluencer::default()
        };
        for _ in 0..16 {
            let mut p = h.particle(1.0, Vec3::Y);
            h.spawn(&mut sprite, &mut p);
            assert!(p.sprite_col < 3 && p.sprite_row < 2);
        }
    }

    #[test]
    fn tiny_frame_duration_skips_in_one_step() {
        let mut h = sheet(4, 4);
        let mut sprite = SpriteInfluencer::default().with_cycle(1e-9);
        let mut p = h.particle(10.0, Vec3::Y);
        h.spawn(&mut sprite, &mut p);
        h.step(&mut sprite, &mut p, 1.0);
        assert!(p.sprite_col < 4 && p.sprite_row < 4);
    }

    #[test]
    fn frame_duration_must_be_positive() {
        let mut sprite = SpriteInfluencer::default();
        assert!(sprite.set_cycle(0.0).is_err());
        assert!(sprite.set_cycle(f32::INFINITY).is_err());
        assert!(!sprite.cycle);
        sprite.set_cycle(0.05).unwrap();
        assert!(sprite.cycle);
        assert!(SpriteInfluencer::default().with_cycle(-0.1).validate().is_err());
    }
}
