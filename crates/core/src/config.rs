use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://howlongtobeat.com/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";
/// Search endpoint used when the bundle does not reveal one.
pub const DEFAULT_SEARCH_PATH: &str = "api/s/";
/// Tokens are trusted for 24 hours.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Settings for talking to the site. Every field has a default, so a
/// partial TOML file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub token_ttl_seconds: u64,
    pub search_path: String,
    pub page_size: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 15,
            token_ttl_seconds: DEFAULT_TOKEN_TTL.as_secs(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ScraperConfig {
    /// Config pointing at another site root, e.g. a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ScraperConfig = toml::from_str(&content)?;
        if !config.base_url.is_empty() && !config.base_url.ends_with('/') {
            config.base_url.push('/');
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise the built-in defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!("Configuration file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }
        if Url::parse(&self.base_url).is_err() {
            anyhow::bail!("base_url '{}' is not a valid URL", self.base_url);
        }
        if self.timeout_seconds == 0 {
            anyhow::bail!("timeout_seconds must be greater than 0");
        }
        if self.page_size == 0 {
            anyhow::bail!("page_size must be greater than 0");
        }
        Ok(())
    }

    /// Site root with a trailing `/`, so relative paths join beneath it even
    /// when `base_url` was set without one.
    pub fn site_root(&self) -> Result<Url, FetchError> {
        let mut root = self.base_url.clone();
        if !root.ends_with('/') {
            root.push('/');
        }
        Url::parse(&root).map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.base_url)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("HLTB_CONFIG_DIR") {
        PathBuf::from(config_dir).join("config.toml")
    } else {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hltb")
            .join("config.toml")
    }
}
