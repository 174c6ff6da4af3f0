//! JSON configuration of the command-line tools.
//!
//! Every knob has a default; a config only has to name its input
//! directories.

pub mod ridf;
pub mod vector_field;

use crate::matching::MatcherVariant;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Size snapshots are resized to before matching.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 25,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub variant: String,
    /// Half-angle of the window used by the constrained variants.
    pub fov_deg: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            variant: MatcherVariant::PerfectMemory.name().to_string(),
            fov_deg: 90.0,
        }
    }
}

impl MatcherConfig {
    pub fn resolve(&self) -> Result<MatcherVariant, String> {
        let variant: MatcherVariant = self.variant.parse().map_err(|e| format!("{e}"))?;
        if variant.is_constrained() && (self.fov_deg <= 0.0 || !self.fov_deg.is_finite()) {
            return Err(format!("fov_deg must be positive, got {}", self.fov_deg));
        }
        Ok(variant)
    }
}

impl ImageConfig {
    pub fn resolve(&self) -> Result<(usize, usize), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        Ok((self.width, self.height))
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
