use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::components::particle::Particle;

/// Per-particle render data handed to the host renderer.
/// 24 floats = 96 bytes stride; the layout is part of the host contract.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    /// World position (emitter translation applied).
    pub position: [f32; 3],
    /// Length multiplier along velocity (1.0 = no stretch).
    pub stretch: f32,
    pub size: [f32; 3],
    /// Billboard mode discriminant, see [`crate::BillboardMode`].
    pub billboard: f32,
    /// RGBA with the particle's alpha multiplied into A.
    pub color: [f32; 4],
    /// Euler angles in radians.
    pub angles: [f32; 3],
    pub _pad0: f32,
    pub velocity: [f32; 3],
    pub _pad1: f32,
    /// Sprite cell UV offset (xy) and size (zw).
    pub uv: [f32; 4],
}

impl ParticleInstance {
    pub const FLOATS: usize = 24;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Emitter-wide values needed to pack instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackParams {
    pub translation: Vec3,
    pub sprite_cols: u32,
    pub sprite_rows: u32,
    pub billboard: u8,
    /// `Some(factor)` when velocity stretching is on.
    pub stretch_factor: Option<f32>,
}

impl ParticleInstance {
    pub fn pack(particle: &Particle, params: &PackParams) -> Self {
        let cols = params.sprite_cols.max(1) as f32;
        let rows = params.sprite_rows.max(1) as f32;
        let stretch = match params.stretch_factor {
            Some(factor) => 1.0 + particle.velocity.length() * factor,
            None => 1.0,
        };
        let mut color = particle.color;
        color.w *= particle.alpha;
        Self {
            position: (params.translation + particle.position).to_array(),
            stretch,
            size: particle.size.to_array(),
            billboard: params.billboard as f32,
            color: color.to_array(),
            angles: particle.angles.to_array(),
            _pad0: 0.0,
            velocity: particle.velocity.to_array(),
            _pad1: 0.0,
            uv: [
                particle.sprite_col as f32 / cols,
                particle.sprite_row as f32 / rows,
                1.0 / cols,
                1.0 / rows,
            ],
        }
    }
}

/// Packed instances for the live particles of one emitter.
#[derive(Debug, Default)]
pub struct InstanceBuffer {
    instances: Vec<ParticleInstance>,
}

impl InstanceBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: ParticleInstance) {
        self.instances.push(instance);
    }

    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Raw bytes for upload to a GPU vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}
