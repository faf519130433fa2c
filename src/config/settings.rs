//! Plugin settings declared to the host and read back on every invocation.

use serde::{Deserialize, Serialize};

use crate::core::annotator::{AnnotateOptions, DateRepr};
use crate::core::Platform;
use crate::host::SettingsStore;

pub const INSERT_IMAGE: &str = "insertImage";
pub const INSERT_VIDEO: &str = "insertVideo";
pub const DATE_AS_TEXT: &str = "dateAsText";
pub const VIMEO_ACCESS_TOKEN: &str = "vimeoAccessToken";
pub const YOUTUBE_API_KEY: &str = "youtubeApiKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Boolean,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: SettingKind,
    pub default: SettingValue,
}

pub fn settings_schema() -> Vec<SettingSpec> {
    vec![
        SettingSpec {
            key: INSERT_IMAGE,
            label: "Insert cover image under the block",
            kind: SettingKind::Boolean,
            default: SettingValue::Bool(true),
        },
        SettingSpec {
            key: INSERT_VIDEO,
            label: "Insert embedded video under the block",
            kind: SettingKind::Boolean,
            default: SettingValue::Bool(false),
        },
        SettingSpec {
            key: DATE_AS_TEXT,
            label: "Write the publish date as text first",
            kind: SettingKind::Boolean,
            default: SettingValue::Bool(false),
        },
        SettingSpec {
            key: VIMEO_ACCESS_TOKEN,
            label: "Vimeo access token",
            kind: SettingKind::String,
            default: SettingValue::Text(String::new()),
        },
        SettingSpec {
            key: YOUTUBE_API_KEY,
            label: "YouTube Data API key (optional)",
            kind: SettingKind::String,
            default: SettingValue::Text(String::new()),
        },
    ]
}

/// API credentials taken from the settings. Empty strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub vimeo_token: Option<String>,
    pub youtube_api_key: Option<String>,
}

impl Credentials {
    pub fn has_required(&self, platform: Platform) -> bool {
        match platform {
            Platform::Vimeo => self.vimeo_token.is_some(),
            Platform::Bilibili | Platform::YouTube => true,
        }
    }
}

/// Snapshot of the plugin settings taken at call time.
#[derive(Debug, Clone)]
pub struct PluginSettings {
    pub insert_image: bool,
    pub insert_video: bool,
    pub date_as_text: bool,
    pub credentials: Credentials,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            insert_image: true,
            insert_video: false,
            date_as_text: false,
            credentials: Credentials::default(),
        }
    }
}

impl PluginSettings {
    pub async fn read(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            insert_image: read_bool(store, INSERT_IMAGE, defaults.insert_image).await,
            insert_video: read_bool(store, INSERT_VIDEO, defaults.insert_video).await,
            date_as_text: read_bool(store, DATE_AS_TEXT, defaults.date_as_text).await,
            credentials: Credentials {
                vimeo_token: read_secret(store, VIMEO_ACCESS_TOKEN).await,
                youtube_api_key: read_secret(store, YOUTUBE_API_KEY).await,
            },
        }
    }

    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            insert_image: self.insert_image,
            insert_video: self.insert_video,
            primary_date: if self.date_as_text {
                DateRepr::Text
            } else {
                DateRepr::Date
            },
        }
    }
}

async fn read_bool(store: &dyn SettingsStore, key: &str, default: bool) -> bool {
    match store.get(key).await {
        Some(SettingValue::Bool(value)) => value,
        Some(SettingValue::Text(other)) => {
            tracing::warn!("Setting {} holds text {:?}, expected a boolean", key, other);
            default
        }
        None => default,
    }
}

async fn read_secret(store: &dyn SettingsStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Some(SettingValue::Text(value)) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}
