//! Core error types

use futures::task::SpawnError;
use thiserror::Error;

/// Errors raised by the cooperative runtime
#[derive(Error, Debug)]
pub enum CoreError {
    /// The executor backing a runtime handle has been dropped
    #[error("Failed to spawn task: {0}")]
    Spawn(#[from] SpawnError),
}

/// Result type for core runtime operations
pub type Result<T> = std::result::Result<T, CoreError>;
