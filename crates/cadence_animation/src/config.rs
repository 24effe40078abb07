//! Player configuration
//!
//! Initial playback state for a [`TweenPlayer`](crate::TweenPlayer), loadable
//! from TOML. Every field has a default, so an empty document is valid:
//!
//! ```toml
//! speed = -0.5
//! yoyo = "end"
//! loop = true
//! recompute_duration = true
//! preview_scrub = false
//! tracker_stage = "late_update"
//! seed = 42
//! ```

use crate::error::{AnimationError, Result};
use crate::player::YoyoMode;
use cadence_core::UpdateStage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Signed playback rate; negative plays backward
    pub speed: f32,
    pub yoyo: YoyoMode,
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Re-resolve the tree duration (and jitter) on every play
    pub recompute_duration: bool,
    /// Apply a frozen pass whenever progress is set directly
    pub preview_scrub: bool,
    /// Stage the progress tracker follows
    pub tracker_stage: UpdateStage,
    /// Seed for duration jitter
    pub seed: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            yoyo: YoyoMode::None,
            looping: false,
            recompute_duration: true,
            preview_scrub: false,
            tracker_stage: UpdateStage::Update,
            seed: default_seed(),
        }
    }
}

fn default_seed() -> u64 {
    0x5EED
}

impl PlayerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AnimationError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded player config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}
