//! Configuration management for Mekuru.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "Mekuru";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Default desktop browser user agent sent with every request.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fetching behavior settings.
    pub scraper: ScraperConfig,

    /// Detection engine settings.
    pub detection: DetectionConfig,

    /// Image download settings.
    pub download: DownloadConfig,

    /// Metadata sidecar settings.
    pub metadata: MetadataConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            detection: DetectionConfig::default(),
            download: DownloadConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

/// Fetching behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// User agent header sent with page and image requests.
    pub user_agent: String,

    /// Minimum image count for a page to count as a scraped gallery.
    pub min_images_threshold: usize,

    /// Delay between page requests in seconds.
    pub delay_between_requests_sec: f64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_images_threshold: 5,
            delay_between_requests_sec: 1.0,
        }
    }
}

/// Detection engine configuration.
///
/// The selector lists are ordered: earlier entries are tried first and
/// the first usable match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// CSS selectors tried when locating the gallery container.
    pub gallery_selectors: Vec<String>,

    /// CSS selectors whose presence disqualifies a fallback container
    /// (sidebars, navigation, ad blocks).
    pub exclude_selectors: Vec<String>,

    /// CSS selectors tried when looking for a gallery "next page" link.
    pub pagination_selectors: Vec<String>,

    /// Whether to follow gallery pagination at all.
    pub detect_pagination: bool,

    /// Upper bound on pages fetched per gallery or listing traversal.
    pub max_pages: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            gallery_selectors: vec![
                ".gallery".to_string(),
                "#gallery".to_string(),
                ".comic".to_string(),
                ".pages".to_string(),
                "[class*=\"gallery\"]".to_string(),
                "[id*=\"gallery\"]".to_string(),
            ],
            exclude_selectors: vec![
                ".sidebar".to_string(),
                ".navigation".to_string(),
                ".menu".to_string(),
                ".footer".to_string(),
                ".header".to_string(),
                ".ad".to_string(),
                ".advertisement".to_string(),
            ],
            pagination_selectors: vec![
                "a.next".to_string(),
                "a[rel=\"next\"]".to_string(),
                ".pagination a".to_string(),
                ".pager a".to_string(),
                "a.nextpostslink".to_string(),
            ],
            detect_pagination: true,
            max_pages: 100,
        }
    }
}

/// Image download configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Root directory for downloaded galleries.
    pub output_dir: PathBuf,

    /// Whether each gallery gets its own subdirectory under the root.
    pub create_subdirs: bool,

    /// Maximum concurrent image downloads.
    pub max_concurrent: usize,

    /// Number of attempts per image.
    pub max_retries: u32,

    /// Delay between retry attempts in seconds.
    pub retry_delay_sec: f64,

    /// Smaller downloads are discarded as non-content (ads, spacers).
    pub min_image_size_kb: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            create_subdirs: true,
            max_concurrent: 5,
            max_retries: 3,
            retry_delay_sec: 2.0,
            min_image_size_kb: 15,
        }
    }
}

/// Metadata sidecar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Whether to write `metadata.json` next to the downloaded images.
    pub save_metadata: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            save_metadata: true,
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            // Create default config
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                key: "detection.max_pages".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.download.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                key: "download.max_concurrent".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.download.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                key: "download.max_retries".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
