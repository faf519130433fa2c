pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod host;
pub mod utils;

pub use crate::config::{Config, PluginSettings};
pub use crate::core::{ExtractorEngine, Platform, PipelineError, Plugin, Trigger, VideoInfo};
pub use extractors::{BilibiliExtractor, VimeoExtractor, YouTubeExtractor};
pub use host::{HostEditor, Notifier, SettingsStore};
