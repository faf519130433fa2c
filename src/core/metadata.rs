use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::format_date;

/// Platform-agnostic result of a metadata fetch.
///
/// Every field may be absent. A missing cover image is how callers recognize
/// a failed fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub cover_url: Option<Url>,
    pub author_name: Option<String>,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub publish_date: Option<NaiveDate>,
    pub embed_url: Option<Url>,
}

impl VideoInfo {
    pub fn is_empty(&self) -> bool {
        self.cover_url.is_none()
            && self.author_name.is_none()
            && self.title.is_none()
            && self.tags.is_empty()
            && self.publish_date.is_none()
            && self.embed_url.is_none()
    }

    /// Appends a tag unless it is blank or already present.
    pub fn push_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return;
        }
        self.tags.push(tag.to_string());
    }

    pub fn extend_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.push_tag(tag.as_ref());
        }
    }

    /// Tags joined with `|`. Names containing `|` are written unescaped.
    pub fn joined_tags(&self) -> String {
        self.tags.join("|")
    }

    pub fn publish_date_text(&self) -> Option<String> {
        self.publish_date.map(format_date)
    }
}

/// One candidate thumbnail returned by a platform API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Widest thumbnail wins; among equal widths the later candidate is kept.
pub fn select_best_thumbnail(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails
        .iter()
        .filter(|t| !t.url.is_empty())
        .max_by_key(|t| t.width.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumb(url: &str, width: Option<u32>) -> Thumbnail {
        Thumbnail {
            url: url.to_string(),
            width,
            height: None,
        }
    }

    #[test]
    fn test_tags_keep_api_order_without_duplicates() {
        let mut info = VideoInfo::default();
        info.extend_tags(["music", "live", "", "music", " jazz "]);
        assert_eq!(info.tags, vec!["music", "live", "jazz"]);
        assert_eq!(info.joined_tags(), "music|live|jazz");
    }

    #[test]
    fn test_default_info_is_empty() {
        let info = VideoInfo::default();
        assert!(info.is_empty());
        assert_eq!(info.publish_date_text(), None);
        assert_eq!(info.joined_tags(), "");
    }

    #[test]
    fn test_select_best_thumbnail_prefers_widest() {
        let thumbs = vec![
            thumb("small", Some(100)),
            thumb("large", Some(1920)),
            thumb("medium", Some(640)),
            thumb("unknown", None),
        ];
        assert_eq!(select_best_thumbnail(&thumbs).map(|t| t.url.as_str()), Some("large"));
        assert!(select_best_thumbnail(&[]).is_none());
    }
}
