//! Animation error types

use cadence_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised outside of steady-state playback
#[derive(Error, Debug)]
pub enum AnimationError {
    /// Failed to read a configuration file
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid TOML or has the wrong shape
    #[error("Failed to parse player config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize player config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Runtime error, e.g. spawning on a dropped executor
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
