use super::{read_json, ImageConfig, MatcherConfig};
use crate::backend::InfoMaxParams;
use crate::evaluation::EvaluationParams;
use crate::matching::MatcherVariant;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct VectorFieldConfig {
    /// Route database directory.
    pub route: PathBuf,
    /// Grid database directory.
    pub grid: PathBuf,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default = "default_decimate_distance_cm")]
    pub decimate_distance_cm: f64,
    #[serde(default)]
    pub evaluation: EvaluationParams,
    #[serde(default)]
    pub infomax: InfoMaxParams,
    #[serde(default)]
    pub output: VectorFieldOutputConfig,
}

fn default_decimate_distance_cm() -> f64 {
    15.0
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VectorFieldOutputConfig {
    /// Per-point CSV; written to stdout when absent.
    pub csv: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

/// Validated settings of one vector field run.
#[derive(Debug)]
pub struct VectorFieldSettings {
    pub variant: MatcherVariant,
    pub fov_deg: f64,
    pub width: usize,
    pub height: usize,
    pub decimate_distance_cm: f64,
    pub evaluation: EvaluationParams,
}

impl VectorFieldConfig {
    pub fn resolve(&self) -> Result<VectorFieldSettings, String> {
        let variant = self.matcher.resolve()?;
        let (width, height) = self.image.resolve()?;
        if self.decimate_distance_cm < 0.0 || !self.decimate_distance_cm.is_finite() {
            return Err(format!(
                "decimate_distance_cm must be non-negative, got {}",
                self.decimate_distance_cm
            ));
        }
        let evaluation = self.evaluation.clone();
        if evaluation.roi_radius_cm <= 0.0 || evaluation.good_match_radius_cm <= 0.0 {
            return Err("evaluation radii must be positive".to_string());
        }
        Ok(VectorFieldSettings {
            variant,
            fov_deg: self.matcher.fov_deg,
            width,
            height,
            decimate_distance_cm: self.decimate_distance_cm,
            evaluation,
        })
    }
}

pub fn load_config(path: &Path) -> Result<VectorFieldConfig, String> {
    read_json(path)
}
