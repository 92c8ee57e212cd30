pub mod instance;

// Re-export key types for convenient access
pub use instance::{InstanceBuffer, PackParams, ParticleInstance};
