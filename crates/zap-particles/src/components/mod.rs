#[cfg(feature = "physics")]
pub mod collider;
pub mod emitter;
pub mod mesh;
pub mod particle;
pub mod shape;
