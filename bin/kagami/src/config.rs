use std::path::{Path, PathBuf};

use kagami::VideoSelection;
use serde::{Deserialize, Serialize};

/// Values read from `--config`. Command line arguments take precedence.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache_dir: Option<PathBuf>,
    pub provider: Option<String>,
    pub grace_minutes: Option<u64>,
    pub sweep_margin_minutes: Option<u64>,
    /// Seconds.
    pub index_timeout: Option<u64>,
    pub cookies: Vec<String>,
    pub playlist: PlaylistConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    pub video_selection: Option<VideoSelection>,
    pub audio_group_id: Option<String>,
    pub chapter_languages: Option<Vec<String>>,
}

impl Config {
    pub fn load(file: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(file)?;
        let config = toml::from_str(&data)?;
        Ok(config)
    }
}
