//! Error types for emitter configuration, host hookup and persistence.

use thiserror::Error;

/// A setter rejected its input. The previous value stays in effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("emissions per second must be finite and > 0, got {0}")]
    InvalidEmissionRate(f32),

    #[error("particles per emission must be at least 1")]
    InvalidParticlesPerEmission,

    #[error("max particles must be at least 1")]
    InvalidMaxParticles,

    #[error("invalid {name} range: min {min} must be >= 0 and <= max {max}")]
    InvalidRange {
        name: &'static str,
        min: f32,
        max: f32,
    },

    #[error("sprite sheet needs at least one column and one row, got {cols}x{rows}")]
    InvalidSpriteLayout { cols: u32, rows: u32 },

    #[error("{name} must be finite and >= 0, got {value}")]
    NegativeDuration { name: &'static str, value: f32 },

    #[error("{name} must be finite and > 0, got {value}")]
    NonPositiveDuration { name: &'static str, value: f32 },
}

/// Host resources needed to initialize an emitter were unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no asset loader attached to emitter")]
    LoaderUnavailable,

    #[error("texture not available: {0}")]
    TextureUnavailable(String),
}

/// A host collidable failed to answer a collision query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollisionError {
    #[error("collision query failed: {0}")]
    Query(String),
}

/// Reading or writing a persisted emitter descriptor failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported descriptor version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages() {
        let err = ConfigError::InvalidSpriteLayout { cols: 0, rows: 2 };
        assert_eq!(
            err.to_string(),
            "sprite sheet needs at least one column and one row, got 0x2"
        );
        let err = ConfigError::InvalidRange { name: "life", min: 2.0, max: 1.0 };
        assert!(err.to_string().contains("life"));
    }

    #[test]
    fn persist_error_wraps_json() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: PersistError = json_err.into();
        assert!(matches!(err, PersistError::Json(_)));
    }
}
