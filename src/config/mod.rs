pub mod settings;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use settings::{settings_schema, Credentials, PluginSettings, SettingKind, SettingSpec, SettingValue};

/// Process-level configuration. Per-document toggles and credentials live in
/// [`PluginSettings`] and are read from the host on every invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: Endpoints,
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    /// Attempts made by the retrying client, including the first.
    pub retries: usize,
    pub retry_delay_ms: u64,
    /// Pause between inserting a tag and reading the block back.
    pub settle_delay_ms: u64,
    pub paste_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub bilibili_api: String,
    pub vimeo_api: String,
    pub vimeo_oembed: String,
    pub youtube_api: String,
    pub youtube_oembed: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            bilibili_api: "https://api.bilibili.com".to_string(),
            vimeo_api: "https://api.vimeo.com".to_string(),
            vimeo_oembed: "https://vimeo.com".to_string(),
            youtube_api: "https://www.googleapis.com".to_string(),
            youtube_oembed: "https://www.youtube.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every platform at the same base URL.
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            bilibili_api: base.clone(),
            vimeo_api: base.clone(),
            vimeo_oembed: base.clone(),
            youtube_api: base.clone(),
            youtube_oembed: base,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            user_agent: format!("vidtag/{}", env!("CARGO_PKG_VERSION")),
            timeout: 10,
            retries: 3,
            retry_delay_ms: 1000,
            settle_delay_ms: 100,
            paste_delay_ms: 300,
        }
    }
}

impl Config {
    /// Reads a TOML file when a path is given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(raw)?;
        if config.retries == 0 {
            anyhow::bail!("retries must be at least 1");
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn paste_delay(&self) -> Duration {
        Duration::from_millis(self.paste_delay_ms)
    }
}
