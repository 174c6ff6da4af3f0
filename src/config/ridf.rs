use super::{read_json, ImageConfig, MatcherConfig};
use crate::backend::InfoMaxParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct RidfConfig {
    /// Route database the matcher is trained on.
    pub route: PathBuf,
    pub test_image: PathBuf,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub infomax: InfoMaxParams,
    /// RIDF CSV; written to stdout when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<RidfConfig, String> {
    read_json(path)
}
