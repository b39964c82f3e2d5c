//! # Engine Error Types
//!
//! Failures at the engine boundary: configuration files and assets.

use std::path::PathBuf;

use ember_animation::AnimationError;
use thiserror::Error;

/// Errors that can occur while setting up or feeding the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML for the engine.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Geometry failed validation.
    #[error("invalid asset: {0}")]
    Asset(#[from] AnimationError),

    /// No geometry is registered under the name.
    #[error("geometry not found: {0}")]
    UnknownGeometry(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
