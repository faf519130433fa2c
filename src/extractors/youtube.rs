use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{build_client, get_json};
use crate::config::{Config, Credentials};
use crate::core::{Extractor, Platform, VideoInfo};
use crate::utils::{date_from_iso, parse_media_url, today_utc};

/// YouTube client with two modes: the Data API when a key is configured,
/// otherwise the keyless oEmbed endpoint.
///
/// oEmbed carries no tags and no publish date, so today's date stands in.
/// A failed Data API call is not retried through oEmbed.
pub struct YouTubeExtractor {
    client: reqwest::Client,
    api_base: String,
    oembed_base: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    items: Option<Vec<VideoItem>>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    channel_title: Option<String>,
    published_at: Option<String>,
    tags: Option<Vec<String>>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<ThumbnailRef>,
    medium: Option<ThumbnailRef>,
    high: Option<ThumbnailRef>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailRef {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

impl Thumbnails {
    /// high, then medium, then default.
    fn best(&self) -> Option<Url> {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .filter_map(|t| t.url.as_deref())
            .find_map(parse_media_url)
    }
}

impl YouTubeExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            api_base: config.endpoints.youtube_api.trim_end_matches('/').to_string(),
            oembed_base: config.endpoints.youtube_oembed.trim_end_matches('/').to_string(),
        })
    }

    pub fn watch_url(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", id)
    }

    pub fn embed_url(id: &str) -> Option<Url> {
        Url::parse(&format!("https://www.youtube.com/embed/{}", id)).ok()
    }

    async fn extract_with_api(&self, id: &str, key: &str) -> Result<VideoInfo> {
        let url = format!("{}/youtube/v3/videos", self.api_base);
        tracing::debug!("Fetching YouTube Data API snippet for {}", id);
        let response: VideoListResponse = get_json(
            self.client
                .get(&url)
                .query(&[("part", "snippet"), ("id", id), ("key", key)]),
        )
        .await?;

        let snippet = response
            .items
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .ok_or_else(|| anyhow::anyhow!("YouTube video {} not found", id))?;

        let mut info = VideoInfo {
            cover_url: snippet.thumbnails.as_ref().and_then(Thumbnails::best),
            author_name: snippet.channel_title,
            title: snippet.title,
            publish_date: snippet.published_at.as_deref().and_then(date_from_iso),
            embed_url: Self::embed_url(id),
            ..Default::default()
        };
        info.extend_tags(snippet.tags.unwrap_or_default());
        Ok(info)
    }

    async fn extract_oembed(&self, id: &str) -> Result<VideoInfo> {
        let oembed_url = format!(
            "{}/oembed?url={}&format=json",
            self.oembed_base,
            urlencoding::encode(&Self::watch_url(id))
        );
        tracing::debug!("Fetching from YouTube oEmbed: {}", oembed_url);

        let oembed: OEmbed = get_json(self.client.get(&oembed_url)).await?;
        Ok(VideoInfo {
            cover_url: oembed.thumbnail_url.as_deref().and_then(parse_media_url),
            author_name: oembed.author_name,
            title: oembed.title,
            tags: Vec::new(),
            publish_date: Some(today_utc()),
            embed_url: Self::embed_url(id),
        })
    }
}

#[async_trait]
impl Extractor for YouTubeExtractor {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn extract(&self, id: &str, credentials: &Credentials) -> Result<VideoInfo> {
        match credentials.youtube_api_key.as_deref() {
            Some(key) => self.extract_with_api(id, key).await,
            None => self.extract_oembed(id).await,
        }
    }
}
