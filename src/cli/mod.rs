use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::settings::{DATE_AS_TEXT, INSERT_IMAGE, INSERT_VIDEO, VIMEO_ACCESS_TOKEN, YOUTUBE_API_KEY};
use crate::config::{Config, SettingValue};
use crate::core::{Plugin, Trigger};
use crate::host::{Fragment, MemoryHost, MemorySettings, TracingNotifier};

/// Runs the tagging pipeline against a one-block in-memory note and prints
/// the resulting document.
#[derive(Parser)]
#[command(name = "vidtag")]
#[command(about = "Fetch video metadata for a link and show the tags it would write")]
#[command(version)]
pub struct Cli {
    /// Link or text to place in the note block
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Vimeo access token
    #[arg(long, env = "VIDTAG_VIMEO_TOKEN", hide_env_values = true)]
    pub vimeo_token: Option<String>,

    /// YouTube Data API key
    #[arg(long, env = "VIDTAG_YOUTUBE_KEY", hide_env_values = true)]
    pub youtube_key: Option<String>,

    /// Do not insert the cover image block
    #[arg(long)]
    pub no_image: bool,

    /// Insert an embedded video block
    #[arg(long)]
    pub video: bool,

    /// Write the publish date as text first
    #[arg(long)]
    pub date_as_text: bool,
}

impl Cli {
    fn settings(&self) -> MemorySettings {
        let settings = MemorySettings::new()
            .with(INSERT_IMAGE, SettingValue::Bool(!self.no_image))
            .with(INSERT_VIDEO, SettingValue::Bool(self.video))
            .with(DATE_AS_TEXT, SettingValue::Bool(self.date_as_text));
        if let Some(token) = &self.vimeo_token {
            settings.set(VIMEO_ACCESS_TOKEN, SettingValue::Text(token.clone()));
        }
        if let Some(key) = &self.youtube_key {
            settings.set(YOUTUBE_API_KEY, SettingValue::Text(key.clone()));
        }
        settings
    }

    fn fragment(&self) -> Fragment {
        let text = self.text.trim();
        if url::Url::parse(text).is_ok() {
            Fragment::link(text)
        } else {
            Fragment::text(text)
        }
    }

    pub async fn run(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let host = Arc::new(MemoryHost::new());
        let block_id = host.add_block(vec![self.fragment()]);

        let plugin = Plugin::load(
            config,
            host.clone(),
            Arc::new(self.settings()),
            Arc::new(TracingNotifier),
        )
        .await?;

        let outcome = plugin.handle(Trigger::Command, block_id).await;
        plugin.unload();

        println!("{}", serde_json::to_string_pretty(&host.snapshot())?);
        outcome?;
        Ok(())
    }
}
