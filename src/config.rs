//! Engine configuration
//!
//! One JSON document describes the platform, the ambience and the effects.
//! Every field has a default, so `{}` is a valid configuration.

use crate::ambient::AmbientConfig;
use crate::engine::buffer::DEFAULT_SAMPLE_RATE;
use crate::engine::platform::{AutoplayPolicy, OfflinePlatform};
use crate::error::{NebulaError, Result};
use crate::sfx::EffectsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Lowest supported render rate
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest supported render rate
pub const MAX_SAMPLE_RATE: u32 = 192000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub autoplay: AutoplayPolicy,
    pub ambient: AmbientConfig,
    pub effects: EffectsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            autoplay: AutoplayPolicy::default(),
            ambient: AmbientConfig::default(),
            effects: EffectsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(NebulaError::InvalidParameter {
                param: "sample_rate".to_string(),
                value: self.sample_rate as f64,
                min: MIN_SAMPLE_RATE as f64,
                max: MAX_SAMPLE_RATE as f64,
            });
        }
        self.ambient.validate(self.sample_rate)?;
        self.effects.validate()
    }

    /// Offline platform matching this configuration
    pub fn platform(&self) -> OfflinePlatform {
        OfflinePlatform::new(self.sample_rate, self.autoplay)
    }
}
