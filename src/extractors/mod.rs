pub mod bilibili;
pub mod matcher;
pub mod vimeo;
pub mod youtube;

pub use bilibili::BilibiliExtractor;
pub use matcher::{detect_platform, Detection, LinkMatcher};
pub use vimeo::VimeoExtractor;
pub use youtube::YouTubeExtractor;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::config::Config;

pub(crate) fn build_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to create HTTP client")
}

/// Sends the request and decodes a JSON body. Non-2xx statuses surface as
/// `reqwest::Error` so callers can inspect the status code.
pub(crate) async fn get_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request.send().await?.error_for_status()?;
    let body = response.text().await?;
    serde_json::from_str(&body).with_context(|| {
        let sample: String = body.chars().take(200).collect();
        format!("Malformed JSON payload: {}", sample)
    })
}
