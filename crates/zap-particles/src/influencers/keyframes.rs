//! Keyframe timing shared by the alpha, color, size, rotation, and
//! destination influencers.
//!
//! A track of N keyframes splits a particle's life into N-1 equal segments,
//! or into fixed-length segments when cycling. The cursor advances by whole
//! segments and wraps to keyframe 0 past the last one, even without cycling:
//! the pool's age check normally kills the particle before a non-cycling
//! track wraps.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::components::emitter::check_step;
use crate::core::error::ConfigError;
use crate::core::rng::ParticleRng;
use crate::extensions::easing::Easing;

/// Values that can be interpolated between keyframes.
pub trait Blend: Copy {
    fn blend(self, other: Self, t: f32) -> Self;
}

impl Blend for f32 {
    #[inline]
    fn blend(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Blend for Vec3 {
    #[inline]
    fn blend(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Blend for Vec4 {
    #[inline]
    fn blend(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

/// A value and the curve used to leave it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub value: T,
    #[serde(default)]
    pub curve: Easing,
}

/// Per-particle position within a track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyframeCursor {
    pub index: usize,
    /// Time spent in the current segment.
    pub interval: f32,
    /// Length of one segment for this particle.
    pub duration: f32,
    pub curve: Easing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeTrack<T> {
    pub keys: Vec<Keyframe<T>>,
    /// Loop with a fixed segment length instead of spreading keys over the life.
    #[serde(default)]
    pub cycle: bool,
    #[serde(default = "default_fixed_duration")]
    pub fixed_duration: f32,
    /// Start each particle at a random keyframe.
    #[serde(default)]
    pub random_start: bool,
}

fn default_fixed_duration() -> f32 {
    1.0
}

impl<T> Default for KeyframeTrack<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            cycle: false,
            fixed_duration: default_fixed_duration(),
            random_start: false,
        }
    }
}

impl<T: Blend> KeyframeTrack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: T, curve: Easing) {
        self.keys.push(Keyframe { value, curve });
    }

    pub fn with_key(mut self, value: T, curve: Easing) -> Self {
        self.push(value, curve);
        self
    }

    pub fn with_cycle(mut self, fixed_duration: f32) -> Self {
        self.cycle = true;
        self.fixed_duration = fixed_duration;
        self
    }

    /// Switch to fixed-length segments. Rejects non-finite or non-positive lengths.
    pub fn set_cycle(&mut self, fixed_duration: f32) -> Result<(), ConfigError> {
        check_step("keyframe duration", fixed_duration)?;
        self.cycle = true;
        self.fixed_duration = fixed_duration;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_step("keyframe duration", self.fixed_duration)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Panics if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Keyframe<T> {
        self.keys.remove(index)
    }

    /// Fill an unconfigured track with `defaults`. Returns false when the
    /// track cannot animate (a single keyframe).
    pub(crate) fn ensure_defaults(&mut self, defaults: &[(T, Easing)]) -> bool {
        if self.keys.is_empty() {
            for &(value, curve) in defaults {
                self.push(value, curve);
            }
        }
        self.keys.len() > 1
    }

    /// Segment length for a particle living `life` seconds.
    pub fn segment_duration(&self, life: f32) -> f32 {
        if self.cycle {
            self.fixed_duration
        } else if self.keys.len() > 1 {
            life / (self.keys.len() - 1) as f32
        } else {
            life
        }
    }

    pub fn start(&self, life: f32, rng: &mut ParticleRng) -> KeyframeCursor {
        let index = if self.random_start {
            rng.index(self.keys.len())
        } else {
            0
        };
        KeyframeCursor {
            index,
            interval: 0.0,
            duration: self.segment_duration(life),
            curve: self.keys[index].curve,
        }
    }

    /// Advance by `dt`, skipping whole segments at once. Returns true if at
    /// least one new segment was entered.
    pub fn advance(&self, cursor: &mut KeyframeCursor, dt: f32) -> bool {
        cursor.interval += dt;
        if self.keys.is_empty() || cursor.duration.is_nan() || cursor.duration <= 0.0 || cursor.interval < cursor.duration {
            return false;
        }
        let steps = (cursor.interval / cursor.duration).floor();
        cursor.interval = (cursor.interval - steps * cursor.duration).clamp(0.0, cursor.duration);
        cursor.index = (cursor.index + steps as usize % self.keys.len()) % self.keys.len();
        cursor.curve = self.keys[cursor.index].curve;
        true
    }

    /// Eased progress through the current segment, in curve space.
    pub fn progress(&self, cursor: &KeyframeCursor) -> f32 {
        if cursor.duration <= 0.0 {
            return 1.0;
        }
        cursor.curve.apply((cursor.interval / cursor.duration).clamp(0.0, 1.0))
    }

    /// Start and end values of the current segment. The last keyframe blends back to the first.
    /// Panics on an empty track.
    pub fn segment(&self, cursor: &KeyframeCursor) -> (T, T) {
        let start = self.keys[cursor.index].value;
        let end = self.keys[(cursor.index + 1) % self.keys.len()].value;
        (start, end)
    }

    pub fn value_at(&self, cursor: &KeyframeCursor) -> T {
        let (start, end) = self.segment(cursor);
        start.blend(end, self.progress(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_keys() -> KeyframeTrack<f32> {
        KeyframeTrack::new()
            .with_key(0.0, Easing::Linear)
            .with_key(1.0, Easing::Linear)
            .with_key(0.5, Easing::Linear)
    }

    #[test]
    fn segments_split_life_evenly() {
        let track = three_keys();
        assert_eq!(track.segment_duration(2.0), 1.0);
        assert_eq!(track.clone().with_cycle(0.25).segment_duration(2.0), 0.25);
    }

    #[test]
    fn value_interpolates_within_segment() {
        let track = three_keys();
        let mut rng = ParticleRng::new(1);
        let mut cursor = track.start(2.0, &mut rng);
        track.advance(&mut cursor, 0.5);
        assert!((track.value_at(&cursor) - 0.5).abs() < 1e-5);
        assert!(track.advance(&mut cursor, 1.0));
        assert_eq!(cursor.index, 1);
        assert!((track.value_at(&cursor) - 0.75).abs() < 1e-5);
    }

    #[test]
    fn cursor_wraps_past_last_key() {
        let track = three_keys();
        let mut rng = ParticleRng::new(1);
        let mut cursor = track.start(2.0, &mut rng);
        track.advance(&mut cursor, 3.25);
        assert_eq!(cursor.index, 0);
        assert!((cursor.interval - 0.25).abs() < 1e-5);
    }

    #[test]
    fn last_segment_blends_to_first_key() {
        let track = three_keys();
        let cursor = KeyframeCursor {
            index: 2,
            interval: 0.5,
            duration: 1.0,
            curve: Easing::Linear,
        };
        assert_eq!(track.segment(&cursor), (0.5, 0.0));
        assert!((track.value_at(&cursor) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn curve_shapes_progress() {
        let track = KeyframeTrack::new()
            .with_key(0.0, Easing::Pow2In)
            .with_key(1.0, Easing::Linear);
        let mut rng = ParticleRng::new(1);
        let mut cursor = track.start(1.0, &mut rng);
        track.advance(&mut cursor, 0.5);
        assert!(track.value_at(&cursor) < 0.5);
    }

    #[test]
    fn defaults_fill_empty_track_only() {
        let mut empty: KeyframeTrack<f32> = KeyframeTrack::new();
        assert!(empty.ensure_defaults(&[(1.0, Easing::Linear), (0.0, Easing::Linear)]));
        assert_eq!(empty.len(), 2);

        let mut single = KeyframeTrack::new().with_key(0.3, Easing::Linear);
        assert!(!single.ensure_defaults(&[(1.0, Easing::Linear), (0.0, Easing::Linear)]));
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn random_start_picks_a_key_in_range() {
        let mut track = three_keys();
        track.random_start = true;
        let mut rng = ParticleRng::new(9);
        for _ in 0..32 {
            assert!(track.start(1.0, &mut rng).index < 3);
        }
    }

    #[test]
    fn tiny_segments_skip_in_one_step() {
        let track = three_keys().with_cycle(1e-9);
        let mut rng = ParticleRng::new(1);
        let mut cursor = track.start(2.0, &mut rng);
        assert!(track.advance(&mut cursor, 1.0));
        assert!(cursor.index < 3);
        assert!(cursor.interval >= 0.0 && cursor.interval <= cursor.duration);
    }

    #[test]
    fn empty_track_never_advances() {
        let track: KeyframeTrack<f32> = KeyframeTrack::new();
        let mut cursor = KeyframeCursor {
            duration: 0.5,
            ..KeyframeCursor::default()
        };
        assert!(!track.advance(&mut cursor, 2.0));
        assert_eq!(cursor.index, 0);
    }

    #[test]
    fn cycle_length_must_be_positive() {
        let mut track = three_keys();
        assert!(track.set_cycle(0.0).is_err());
        assert!(track.set_cycle(f32::NAN).is_err());
        assert!(!track.cycle);
        track.set_cycle(0.2).unwrap();
        assert_eq!(track.segment_duration(5.0), 0.2);

        let bad = three_keys().with_cycle(-1.0);
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::NonPositiveDuration { .. })
        ));
    }
}
