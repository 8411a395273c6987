//! Application Configuration
//!
//! Repository coordinates and OCR settings stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Repository settings
    pub github: GithubSettings,
    /// OCR settings
    pub ocr: OcrSettings,
}

/// Repository-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    /// Token for private repos or higher rate limits
    pub token: Option<String>,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch to read from
    pub branch: String,
    /// Default image path within the repository
    pub path: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: None,
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            path: String::new(),
        }
    }
}

/// OCR-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract language code
    pub language: String,
    /// Enhance the image before recognition
    pub preprocessing: bool,
    /// Confidence cutoff for drawing token boxes
    pub confidence_threshold: i32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            preprocessing: true,
            confidence_threshold: crate::ocr::DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Get the default configuration file path
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "githubimageocr", "GithubImageOcr")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir.join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
