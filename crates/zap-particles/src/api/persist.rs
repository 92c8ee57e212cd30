//! Versioned JSON form of an emitter: configuration plus influencer chain.

use serde::{Deserialize, Serialize};

use crate::api::emitter::ParticleEmitter;
use crate::components::emitter::EmitterConfig;
use crate::core::error::PersistError;
use crate::influencers::InfluencerDesc;

/// Current descriptor schema version.
pub const DESCRIPTOR_VERSION: u32 = 1;

/// Everything needed to rebuild an emitter, minus host handles (mesh,
/// loader, collidables, conditional predicates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterDescriptor {
    pub version: u32,
    pub config: EmitterConfig,
    #[serde(default)]
    pub influencers: Vec<InfluencerDesc>,
}

impl EmitterDescriptor {
    /// Parse and check a descriptor.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let descriptor: Self = serde_json::from_str(json)?;
        if descriptor.version != DESCRIPTOR_VERSION {
            log::warn!("rejecting emitter descriptor version {}", descriptor.version);
            return Err(PersistError::UnsupportedVersion {
                found: descriptor.version,
                expected: DESCRIPTOR_VERSION,
            });
        }
        if let Err(err) = descriptor.config.validate() {
            log::warn!("rejecting emitter descriptor: {err}");
            return Err(err.into());
        }
        if let Err(err) = descriptor.influencers.iter().try_for_each(InfluencerDesc::validate) {
            log::warn!("rejecting emitter descriptor: {err}");
            return Err(err.into());
        }
        Ok(descriptor)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ParticleEmitter {
    /// Snapshot of the persistable configuration.
    pub fn descriptor(&self) -> EmitterDescriptor {
        EmitterDescriptor {
            version: DESCRIPTOR_VERSION,
            config: self.config().clone(),
            influencers: self.influencers().describe(),
        }
    }

    /// Fresh emitter from a descriptor. Host handles must be attached afterwards.
    pub fn from_descriptor(descriptor: EmitterDescriptor) -> Result<Self, PersistError> {
        if descriptor.version != DESCRIPTOR_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: descriptor.version,
                expected: DESCRIPTOR_VERSION,
            });
        }
        descriptor.influencers.iter().try_for_each(InfluencerDesc::validate)?;
        let mut emitter = ParticleEmitter::new(descriptor.config)?;
        for desc in descriptor.influencers {
            emitter.add_influencer(desc.build());
        }
        Ok(emitter)
    }
}
