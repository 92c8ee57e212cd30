// extensions/mod.rs
//
// Math extensions shared by the influencers.
// Pure functions with no dependency on the emitter or pool.

pub mod easing;

pub use easing::{Easing, lerp, ease};
