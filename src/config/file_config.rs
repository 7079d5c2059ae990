use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::feed::SearchParams;
use crate::media::CaptionConfig;
use crate::season::SeasonWindow;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub output: Option<String>,
    pub analysis: Option<Vec<String>>,

    // Sections
    pub feed: Option<FeedConfig>,
    pub zone: Option<ZoneConfig>,
    pub seasons: Option<Vec<SeasonWindow>>,
    pub search: Option<SearchParams>,
    /// Kept raw so a bad step is reported with its position.
    pub steps: Option<Vec<toml::Value>>,
    pub caption: Option<CaptionConfig>,
    pub upload: Option<UploadConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: Option<String>,
    pub search_path: Option<String>,
    pub timeout_sec: Option<u64>,
    pub max_workers: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ZoneConfig {
    pub half_width: Option<f64>,
    pub ball_radius: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct UploadConfig {
    pub max_retries: Option<i32>,
    pub initial_backoff_secs: Option<u64>,
    pub max_backoff_secs: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
