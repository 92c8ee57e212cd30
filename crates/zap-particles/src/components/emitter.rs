use serde::{Deserialize, Serialize};

use crate::components::shape::DirectionMode;
use crate::core::error::ConfigError;

/// Where on the emission face particles spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionPoint {
    /// Face centroid.
    #[default]
    Center,
    /// Uniform random point inside the face.
    RandomPoint,
}

/// How the renderer orients particle quads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillboardMode {
    /// Face the camera.
    #[default]
    Camera,
    UnitX,
    UnitY,
    UnitZ,
    /// Align the quad's up axis with velocity.
    Velocity,
    VelocityZUp,
    VelocityZUpYLocal,
}

/// Emitter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Emission events per second.
    pub emissions_per_second: f32,
    /// Particles spawned per emission event.
    pub particles_per_emission: u32,
    /// Pool capacity.
    pub max_particles: usize,
    pub life_min: f32,
    pub life_max: f32,
    /// Initial speed bounds.
    pub force_min: f32,
    pub force_max: f32,
    pub emission_point: EmissionPoint,
    pub direction: DirectionMode,
    /// Walk faces in order instead of picking at random.
    pub sequential_emission_face: bool,
    /// With sequential faces, skip every other face.
    pub sequential_skip_pattern: bool,
    /// Seconds before emission starts.
    pub start_delay: f32,
    /// Seconds after which emission stops. 0 = forever.
    pub emitter_life: f32,
    /// Freeze positions; velocity is still computed.
    pub static_particles: bool,
    pub billboard: BillboardMode,
    pub use_velocity_stretching: bool,
    pub velocity_stretch_factor: f32,
    pub sprite_cols: u32,
    pub sprite_rows: u32,
    /// Texture path handed to the material loader.
    pub texture: String,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            emissions_per_second: 10.0,
            particles_per_emission: 1,
            max_particles: 64,
            life_min: 1.0,
            life_max: 2.0,
            force_min: 0.5,
            force_max: 1.5,
            emission_point: EmissionPoint::Center,
            direction: DirectionMode::Normal,
            sequential_emission_face: false,
            sequential_skip_pattern: false,
            start_delay: 0.0,
            emitter_life: 0.0,
            static_particles: false,
            billboard: BillboardMode::Camera,
            use_velocity_stretching: false,
            velocity_stretch_factor: 0.35,
            sprite_cols: 1,
            sprite_rows: 1,
            texture: "textures/particle.png".to_string(),
        }
    }
}

impl EmitterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Builder pattern --

    pub fn with_emissions_per_second(mut self, rate: f32) -> Self {
        self.emissions_per_second = rate;
        self
    }

    pub fn with_particles_per_emission(mut self, count: u32) -> Self {
        self.particles_per_emission = count;
        self
    }

    pub fn with_max_particles(mut self, max: usize) -> Self {
        self.max_particles = max;
        self
    }

    pub fn with_life(mut self, min: f32, max: f32) -> Self {
        self.life_min = min;
        self.life_max = max;
        self
    }

    pub fn with_force(mut self, min: f32, max: f32) -> Self {
        self.force_min = min;
        self.force_max = max;
        self
    }

    pub fn with_emission_point(mut self, point: EmissionPoint) -> Self {
        self.emission_point = point;
        self
    }

    pub fn with_direction(mut self, direction: DirectionMode) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_sequential_faces(mut self, skip_pattern: bool) -> Self {
        self.sequential_emission_face = true;
        self.sequential_skip_pattern = skip_pattern;
        self
    }

    pub fn with_start_delay(mut self, delay: f32) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn with_emitter_life(mut self, life: f32) -> Self {
        self.emitter_life = life;
        self
    }

    pub fn with_static_particles(mut self, frozen: bool) -> Self {
        self.static_particles = frozen;
        self
    }

    pub fn with_billboard(mut self, mode: BillboardMode) -> Self {
        self.billboard = mode;
        self
    }

    pub fn with_velocity_stretching(mut self, factor: f32) -> Self {
        self.use_velocity_stretching = true;
        self.velocity_stretch_factor = factor;
        self
    }

    pub fn with_sprite_layout(mut self, cols: u32, rows: u32) -> Self {
        self.sprite_cols = cols;
        self.sprite_rows = rows;
        self
    }

    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = path.into();
        self
    }

    /// Seconds between emission events.
    #[inline]
    pub fn target_interval(&self) -> f32 {
        1.0 / self.emissions_per_second
    }

    /// Check every field a setter would check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate(self.emissions_per_second)?;
        if self.particles_per_emission == 0 {
            return Err(ConfigError::InvalidParticlesPerEmission);
        }
        if self.max_particles == 0 {
            return Err(ConfigError::InvalidMaxParticles);
        }
        check_range("life", self.life_min, self.life_max)?;
        check_range("force", self.force_min, self.force_max)?;
        check_duration("start_delay", self.start_delay)?;
        check_duration("emitter_life", self.emitter_life)?;
        check_sprite_layout(self.sprite_cols, self.sprite_rows)?;
        Ok(())
    }
}

pub(crate) fn check_rate(rate: f32) -> Result<(), ConfigError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidEmissionRate(rate))
    }
}

pub(crate) fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min >= 0.0 && min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { name, min, max })
    }
}

pub(crate) fn check_step(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveDuration { name, value })
    }
}

pub(crate) fn check_duration(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeDuration { name, value })
    }
}

pub(crate) fn check_sprite_layout(cols: u32, rows: u32) -> Result<(), ConfigError> {
    if cols >= 1 && rows >= 1 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSpriteLayout { cols, rows })
    }
}
