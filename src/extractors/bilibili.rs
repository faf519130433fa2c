use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{build_client, get_json};
use crate::config::{Config, Credentials};
use crate::core::{Extractor, Platform, VideoInfo};
use crate::utils::{date_from_epoch, parse_media_url};

/// Bilibili client. Video details and tags come from two endpoints that are
/// queried concurrently; the tag list is optional.
pub struct BilibiliExtractor {
    client: reqwest::Client,
    api_base: String,
    retries: usize,
    retry_delay: Duration,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ViewData {
    bvid: Option<String>,
    title: Option<String>,
    pic: Option<String>,
    pubdate: Option<i64>,
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagItem {
    tag_name: Option<String>,
}

impl BilibiliExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            api_base: config.endpoints.bilibili_api.trim_end_matches('/').to_string(),
            retries: config.retries.max(1),
            retry_delay: config.retry_delay(),
            timeout: config.timeout(),
        })
    }

    /// `av` ids are numeric archive ids, everything else is a BV id.
    fn id_query(id: &str) -> (&'static str, String) {
        match id.strip_prefix("av") {
            Some(aid) => ("aid", aid.to_string()),
            None => ("bvid", id.to_string()),
        }
    }

    async fn get_with_retry<T: DeserializeOwned>(&self, path: &str, id: &str) -> Result<T> {
        let url = format!("{}{}", self.api_base, path);
        let query = [Self::id_query(id)];
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = self
                .client
                .get(&url)
                .query(&query)
                .header("Referer", "https://www.bilibili.com/")
                .timeout(self.timeout);

            match get_json::<T>(request).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let client_error = e
                        .downcast_ref::<reqwest::Error>()
                        .and_then(|e| e.status())
                        .is_some_and(|s| s.is_client_error());
                    if client_error || attempt >= self.retries {
                        return Err(e);
                    }
                    tracing::warn!("Bilibili request {} failed (attempt {}): {}", url, attempt, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn fetch_view(&self, id: &str) -> Result<ViewData> {
        let response: ApiResponse<ViewData> = self.get_with_retry("/x/web-interface/view", id).await?;
        if response.code != 0 {
            anyhow::bail!(
                "Bilibili view API returned code {}: {}",
                response.code,
                response.message.unwrap_or_default()
            );
        }
        response
            .data
            .ok_or_else(|| anyhow::anyhow!("Bilibili view API returned no data for {}", id))
    }

    async fn fetch_tags(&self, id: &str) -> Result<Vec<String>> {
        let response: ApiResponse<Vec<TagItem>> = self.get_with_retry("/x/tag/archive/tags", id).await?;
        if response.code != 0 {
            anyhow::bail!("Bilibili tag API returned code {}", response.code);
        }
        Ok(response
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| t.tag_name)
            .collect())
    }

    fn embed_url(view: &ViewData, id: &str) -> Option<Url> {
        let mut url = Url::parse("https://player.bilibili.com/player.html").ok()?;
        let (key, value) = match view.bvid.as_deref() {
            Some(bvid) => ("bvid", bvid.to_string()),
            None => Self::id_query(id),
        };
        url.query_pairs_mut().append_pair(key, &value);
        Some(url)
    }
}

#[async_trait]
impl Extractor for BilibiliExtractor {
    fn platform(&self) -> Platform {
        Platform::Bilibili
    }

    async fn extract(&self, id: &str, _credentials: &Credentials) -> Result<VideoInfo> {
        let (view, tags) = futures::join!(self.fetch_view(id), self.fetch_tags(id));
        let view = view?;
        let tags = tags.unwrap_or_else(|e| {
            tracing::warn!("Bilibili tags unavailable for {}: {}", id, e);
            Vec::new()
        });

        let mut info = VideoInfo {
            cover_url: view.pic.as_deref().and_then(parse_media_url),
            author_name: view.owner.as_ref().and_then(|o| o.name.clone()),
            title: view.title.clone(),
            publish_date: view.pubdate.and_then(date_from_epoch),
            embed_url: Self::embed_url(&view, id),
            ..Default::default()
        };
        info.extend_tags(tags);
        Ok(info)
    }
}
