//! Contracts between the emitter and the host scene graph.

use std::fmt;

use glam::{Quat, Vec3};

use crate::core::error::HostError;

/// Emitter placement pushed by the host each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostTransform {
    pub rotation: Quat,
    pub scale: Vec3,
    pub translation: Vec3,
}

impl Default for HostTransform {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            translation: Vec3::ZERO,
        }
    }
}

impl HostTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }
}

/// Texture dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
}

/// Host asset loader used for lazy initialization.
pub trait MaterialLoader: fmt::Debug {
    fn load_texture(&self, path: &str) -> Result<TextureInfo, HostError>;
}

/// Loader that reports the same texture for any path. For headless hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTextureLoader {
    pub info: TextureInfo,
}

impl FixedTextureLoader {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            info: TextureInfo { width, height },
        }
    }
}

impl MaterialLoader for FixedTextureLoader {
    fn load_texture(&self, _path: &str) -> Result<TextureInfo, HostError> {
        Ok(self.info)
    }
}
