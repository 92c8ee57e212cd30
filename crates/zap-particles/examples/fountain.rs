//! Headless fountain: particles shoot up from a small disc, fall under
//! gravity, bounce off the floor and fade out. Prints pool stats once a second.
//!
//! Run with `RUST_LOG=debug cargo run --example fountain`.

use std::rc::Rc;

use glam::{Vec3, Vec4};
use zap_particles::{
    AlphaInfluencer, BillboardMode, CollisionReaction, ColorInfluencer, DirectionMode, EmissionPoint, EmitterConfig,
    Easing, FixedTextureLoader, GravityInfluencer, KeyframeTrack, ParticleEmitter, PhysicsInfluencer,
    PlaneCollider, SizeInfluencer, TriMesh,
};

const FRAME: f32 = 1.0 / 60.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = EmitterConfig::new()
        .with_emissions_per_second(90.0)
        .with_particles_per_emission(2)
        .with_max_particles(512)
        .with_life(1.5, 2.5)
        .with_force(4.0, 6.0)
        .with_emission_point(EmissionPoint::RandomPoint)
        .with_direction(DirectionMode::RandomNormalAligned)
        .with_billboard(BillboardMode::Velocity)
        .with_velocity_stretching(0.2)
        .with_texture("textures/droplet.png");

    let mut physics = PhysicsInfluencer::new(CollisionReaction::Bounce);
    physics.set_restitution(0.4)?;
    physics.add_collidable(Rc::new(PlaneCollider::new(Vec3::Y, -0.5)));

    let color = ColorInfluencer::new(
        KeyframeTrack::new()
            .with_key(Vec4::new(0.6, 0.8, 1.0, 1.0), Easing::SineOut)
            .with_key(Vec4::new(0.1, 0.3, 0.9, 1.0), Easing::Linear),
    );
    let alpha = AlphaInfluencer::new(
        KeyframeTrack::new()
            .with_key(1.0, Easing::Linear)
            .with_key(0.8, Easing::Pow2In)
            .with_key(0.0, Easing::Linear),
    );

    let mut emitter = ParticleEmitter::new(config)?
        .with_shape(Rc::new(TriMesh::quad(0.5, 0.5)))
        .with_loader(Rc::new(FixedTextureLoader::new(32, 32)))
        .with_influencer(Box::new(GravityInfluencer::new(Vec3::new(0.0, 9.8, 0.0))))
        .with_influencer(Box::new(physics))
        .with_influencer(Box::new(color))
        .with_influencer(Box::new(alpha))
        .with_influencer(Box::new(SizeInfluencer::default().with_random_size(0.3)));

    for frame in 1..=600 {
        emitter.update(FRAME);
        if frame % 60 == 0 {
            let lowest = emitter
                .particles()
                .iter()
                .filter(|p| p.is_active())
                .map(|p| p.position.y)
                .fold(f32::INFINITY, f32::min);
            println!(
                "t={:>4.1}s live={:>3} instances={:>3} bytes={:>6} lowest_y={:.2}",
                frame as f32 * FRAME,
                emitter.active_particle_count(),
                emitter.instances().len(),
                emitter.instance_bytes().len(),
                lowest,
            );
        }
    }

    println!("{}", emitter.descriptor().to_json()?);
    Ok(())
}
