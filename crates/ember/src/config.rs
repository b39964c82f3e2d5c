//! # Engine Configuration
//!
//! Loaded once at startup from a TOML file:
//!
//! ```toml
//! [world]
//! min_free_indices = 256
//! initial_capacity = 4096
//!
//! [frame]
//! max_delta = 0.25
//! time_scale = 1.0
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::Path;

use ember_core::WorldConfig;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Frame pacing settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Longest delta a single frame may simulate, in seconds.
    pub max_delta: f32,
    /// Multiplier applied to every (clamped) delta.
    pub time_scale: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_delta: 0.25,
            time_scale: 1.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// ECS settings.
    pub world: WorldConfig,
    /// Frame pacing.
    pub frame: FrameConfig,
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure or
    /// a value is out of range.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    fn validate(&self) -> EngineResult<()> {
        let frame = &self.frame;
        if !(frame.max_delta.is_finite() && frame.max_delta > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "frame.max_delta must be positive, got {}",
                frame.max_delta
            )));
        }
        if !(frame.time_scale.is_finite() && frame.time_scale >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "frame.time_scale must be non-negative, got {}",
                frame.time_scale
            )));
        }
        Ok(())
    }
}
