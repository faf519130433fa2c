use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::{build_client, get_json};
use crate::config::{Config, Credentials};
use crate::core::{select_best_thumbnail, Extractor, Platform, Thumbnail, VideoInfo};
use crate::utils::{date_from_iso, parse_media_url};

static IFRAME_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).expect("iframe src pattern"));

/// Vimeo API client. Requires an access token.
pub struct VimeoExtractor {
    client: reqwest::Client,
    api_base: String,
    oembed_base: String,
}

#[derive(Debug, Deserialize)]
struct VimeoVideo {
    name: Option<String>,
    user: Option<VimeoUser>,
    tags: Option<Vec<VimeoTag>>,
    created_time: Option<String>,
    release_time: Option<String>,
    pictures: Option<VimeoPictures>,
    player_embed_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VimeoUser {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VimeoTag {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VimeoPictures {
    sizes: Option<Vec<VimeoPictureSize>>,
}

#[derive(Debug, Deserialize)]
struct VimeoPictureSize {
    width: Option<u32>,
    height: Option<u32>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VimeoOEmbed {
    html: Option<String>,
}

impl VimeoExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            api_base: config.endpoints.vimeo_api.trim_end_matches('/').to_string(),
            oembed_base: config.endpoints.vimeo_oembed.trim_end_matches('/').to_string(),
        })
    }

    fn best_picture(video: &VimeoVideo) -> Option<Url> {
        let thumbnails: Vec<Thumbnail> = video
            .pictures
            .iter()
            .flat_map(|p| p.sizes.iter().flatten())
            .filter_map(|size| {
                Some(Thumbnail {
                    url: size.link.clone()?,
                    width: size.width,
                    height: size.height,
                })
            })
            .collect();
        select_best_thumbnail(&thumbnails).and_then(|t| parse_media_url(&t.url))
    }

    /// The release timestamp wins over the creation timestamp.
    fn publish_date(video: &VimeoVideo) -> Option<chrono::NaiveDate> {
        video
            .release_time
            .as_deref()
            .and_then(date_from_iso)
            .or_else(|| video.created_time.as_deref().and_then(date_from_iso))
    }

    /// Asks oEmbed for the player markup and pulls the iframe source out of it.
    async fn lookup_embed_url(&self, id: &str) -> Result<Option<Url>> {
        let watch_url = format!("https://vimeo.com/{}", id);
        let oembed_url = format!(
            "{}/api/oembed.json?url={}",
            self.oembed_base,
            urlencoding::encode(&watch_url)
        );
        tracing::debug!("Fetching Vimeo oEmbed: {}", oembed_url);

        let oembed: VimeoOEmbed = get_json(self.client.get(&oembed_url)).await?;
        Ok(oembed.html.as_deref().and_then(iframe_src).and_then(|src| parse_media_url(&src)))
    }
}

fn iframe_src(html: &str) -> Option<String> {
    IFRAME_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
}

#[async_trait]
impl Extractor for VimeoExtractor {
    fn platform(&self) -> Platform {
        Platform::Vimeo
    }

    async fn extract(&self, id: &str, credentials: &Credentials) -> Result<VideoInfo> {
        let token = credentials
            .vimeo_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Vimeo access token is not configured"))?;

        let url = format!("{}/videos/{}", self.api_base, id);
        tracing::debug!("Fetching Vimeo video: {}", url);
        let video: VimeoVideo = get_json(
            self.client
                .get(&url)
                .bearer_auth(token)
                .header("Accept", "application/vnd.vimeo.*+json;version=3.4"),
        )
        .await?;

        let embed_url = match video.player_embed_url.as_deref().and_then(parse_media_url) {
            Some(url) => Some(url),
            None => self.lookup_embed_url(id).await.unwrap_or_else(|e| {
                tracing::warn!("Vimeo embed lookup failed for {}: {}", id, e);
                None
            }),
        };

        let mut info = VideoInfo {
            cover_url: Self::best_picture(&video),
            author_name: video.user.as_ref().and_then(|u| u.name.clone()),
            title: video.name.clone(),
            publish_date: Self::publish_date(&video),
            embed_url,
            ..Default::default()
        };
        info.extend_tags(video.tags.iter().flatten().filter_map(|t| t.name.as_deref()));
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iframe_src() {
        let html = r#"<iframe src="https://player.vimeo.com/video/76979871?h=8272103f6e&amp;app_id=122963" width="640"></iframe>"#;
        assert_eq!(
            iframe_src(html).as_deref(),
            Some("https://player.vimeo.com/video/76979871?h=8272103f6e&app_id=122963")
        );
        assert_eq!(iframe_src("<div></div>"), None);
    }

    #[test]
    fn test_null_arrays_are_tolerated() {
        let video: VimeoVideo = serde_json::from_str(
            r#"{"tags":null,"pictures":{"sizes":null},"user":{"name":"Someone"}}"#,
        )
        .unwrap();
        assert!(VimeoExtractor::best_picture(&video).is_none());
        assert!(video.tags.is_none());
    }

    #[test]
    fn test_release_time_preferred() {
        let video: VimeoVideo = serde_json::from_str(
            r#"{"created_time":"2013-10-15T14:08:29+00:00","release_time":"2013-10-16T09:00:00+00:00"}"#,
        )
        .unwrap();
        assert_eq!(
            VimeoExtractor::publish_date(&video).map(crate::utils::format_date).as_deref(),
            Some("2013-10-16")
        );

        let video: VimeoVideo = serde_json::from_str(r#"{"created_time":"2013-10-15T14:08:29+00:00"}"#).unwrap();
        assert_eq!(
            VimeoExtractor::publish_date(&video).map(crate::utils::format_date).as_deref(),
            Some("2013-10-15")
        );
    }
}
