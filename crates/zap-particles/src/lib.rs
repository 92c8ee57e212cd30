pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod influencers;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use api::emitter::ParticleEmitter;
pub use api::host::{FixedTextureLoader, HostTransform, MaterialLoader, TextureInfo};
pub use api::persist::{EmitterDescriptor, DESCRIPTOR_VERSION};
pub use components::emitter::{BillboardMode, EmissionPoint, EmitterConfig};
pub use components::mesh::{TriMesh, TriangleMesh};
pub use components::particle::Particle;
pub use components::shape::{DirectionMode, EmitterShape, Triangle};
pub use core::error::{CollisionError, ConfigError, HostError, PersistError};
pub use core::rng::ParticleRng;
pub use renderer::instance::{InstanceBuffer, ParticleInstance};
pub use systems::pool::ParticlePool;
pub use systems::scheduler::EmissionScheduler;

pub use influencers::{
    AlphaInfluencer, ColorInfluencer, Condition, ConditionalInfluencer, DestinationInfluencer,
    GravityAlignment, GravityInfluencer, ImpulseInfluencer, Influencer, InfluencerChain,
    InfluencerContext, InfluencerDesc, InfluencerId, KeyframeTrack, RadialAxisLock, RadialPullCenter,
    RadialUpAlignment, RadialVelocityInfluencer, RotationInfluencer, SizeInfluencer, SpriteInfluencer,
    Waypoint,
};

#[cfg(feature = "physics")]
pub use components::collider::{BoxCollider, Collidable, CollisionProxy, Contact, PlaneCollider, SphereCollider};
#[cfg(feature = "physics")]
pub use influencers::{CollisionReaction, PhysicsInfluencer, PhysicsSettings};

// Extensions: curve math shared by the keyframed influencers
pub use extensions::{ease, lerp, Easing};
