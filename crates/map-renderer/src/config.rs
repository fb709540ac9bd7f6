//! Renderer configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```json
//! { "min_tiles_to_keep": 64, "anti_alias": false }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Largest supported pattern tile edge, in world units.
const MAX_PATTERN_SCALE: f32 = 256.0;

/// Tunables for the frame pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Lower bound on bitmap cache entries retained after eviction
    pub min_tiles_to_keep: usize,
    /// Entries retained per bitmap used in the current frame
    pub tiles_to_keep_multiplier: usize,
    /// Edge length of a fill pattern motif, in world units
    pub pattern_scale: f32,
    /// Anti-alias fills, strokes and clips
    pub anti_alias: bool,
    /// Stroke miter limit
    pub miter_limit: f32,
    /// Frames a cached path may go unused before it is dropped
    pub path_cache_max_age: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            min_tiles_to_keep: 32,
            tiles_to_keep_multiplier: 3,
            pattern_scale: 10.0,
            anti_alias: true,
            miter_limit: 4.0,
            path_cache_max_age: 16,
        }
    }
}

impl RendererConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.tiles_to_keep_multiplier == 0 {
            return Err(RenderError::InvalidConfig(
                "tiles_to_keep_multiplier must be at least 1".to_string(),
            ));
        }
        if !(self.pattern_scale >= 1.0 && self.pattern_scale <= MAX_PATTERN_SCALE) {
            return Err(RenderError::InvalidConfig(format!(
                "pattern_scale must be within 1..={}, got {}",
                MAX_PATTERN_SCALE, self.pattern_scale
            )));
        }
        if !(self.miter_limit.is_finite() && self.miter_limit >= 1.0) {
            return Err(RenderError::InvalidConfig(format!(
                "miter_limit must be >= 1, got {}",
                self.miter_limit
            )));
        }
        Ok(())
    }
}
