use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::Platform;
use crate::host::Block;

static BILIBILI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.|m\.)?bilibili\.com/video/(BV[0-9A-Za-z]{10}|av\d+)(?:[^A-Za-z0-9_-]|$)")
        .expect("bilibili pattern")
});

static VIMEO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.|player\.)?vimeo\.com/(?:video/|channels/[\w-]+/|groups/[\w-]+/videos/)?(\d+)(?:[^\w]|$)",
    )
    .expect("vimeo pattern")
});

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:\S*?&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .expect("youtube pattern")
});

/// Recognizes one platform's links in text and in blocks.
///
/// Each pattern captures the id in group 1 and requires the id to end at a
/// non-id character, so an over-long id is rejected rather than truncated.
pub struct LinkMatcher {
    platform: Platform,
    pattern: &'static Lazy<Regex>,
}

impl LinkMatcher {
    pub fn for_platform(platform: Platform) -> Self {
        let pattern = match platform {
            Platform::Bilibili => &BILIBILI,
            Platform::Vimeo => &VIMEO,
            Platform::YouTube => &YOUTUBE,
        };
        Self { platform, pattern }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn extract_id(&self, url: &str) -> Option<String> {
        self.pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// The first link in the block for this platform.
    ///
    /// Link fragments are checked before the visible text, so a hidden link
    /// target wins over a URL that only appears in prose.
    pub fn extract_url(&self, block: &Block) -> Option<String> {
        if let Some(url) = block.link_urls().find(|url| self.matches(url)) {
            return Some(url.to_string());
        }
        let text = block.text();
        let caps = self.pattern.captures(&text)?;
        let (start, end) = (caps.get(0)?.start(), caps.get(1)?.end());
        Some(text[start..end].to_string())
    }
}

/// A platform link found in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub platform: Platform,
    pub url: String,
    pub id: String,
}

/// Tries each platform in [`Platform::PRIORITY`] order; the first match wins.
pub fn detect_platform(block: &Block) -> Option<Detection> {
    Platform::PRIORITY.iter().find_map(|&platform| {
        let matcher = LinkMatcher::for_platform(platform);
        let url = matcher.extract_url(block)?;
        let id = matcher.extract_id(&url)?;
        tracing::debug!("Detected {} link {} (id {})", platform, url, id);
        Some(Detection { platform, url, id })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Fragment;

    fn block(content: Vec<Fragment>) -> Block {
        Block::new(1, content)
    }

    #[test]
    fn test_bilibili_ids() {
        let m = LinkMatcher::for_platform(Platform::Bilibili);
        assert_eq!(m.extract_id("https://www.bilibili.com/video/BV1GJ411x7h7"), Some("BV1GJ411x7h7".into()));
        assert_eq!(m.extract_id("https://m.bilibili.com/video/BV1GJ411x7h7?p=2"), Some("BV1GJ411x7h7".into()));
        assert_eq!(m.extract_id("bilibili.com/video/av170001"), Some("av170001".into()));
        assert_eq!(m.extract_id("https://www.bilibili.com/video/BVshort"), None);
        assert_eq!(m.extract_id("https://www.bilibili.com/video/BV1GJ411x7h7ab"), None);
        assert_eq!(m.extract_id("https://www.bilibili.com/video/av170001x"), None);
        assert_eq!(m.extract_id("https://space.bilibili.com/12345"), None);
    }

    #[test]
    fn test_vimeo_ids() {
        let m = LinkMatcher::for_platform(Platform::Vimeo);
        assert_eq!(m.extract_id("https://vimeo.com/76979871"), Some("76979871".into()));
        assert_eq!(m.extract_id("https://player.vimeo.com/video/76979871"), Some("76979871".into()));
        assert_eq!(m.extract_id("https://vimeo.com/channels/staffpicks/76979871"), Some("76979871".into()));
        assert_eq!(m.extract_id("https://vimeo.com/groups/motion/videos/123"), Some("123".into()));
        assert_eq!(m.extract_id("https://vimeo.com/about"), None);
        assert_eq!(m.extract_id("https://vimeo.com/123abc"), None);
        assert_eq!(m.extract_id("https://vimeo.com/76979871?share=copy"), Some("76979871".into()));
    }

    #[test]
    fn test_youtube_ids() {
        let m = LinkMatcher::for_platform(Platform::YouTube);
        let cases = [
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtu.be/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=123", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/shorts/abcDEF_1234", "abcDEF_1234"),
            ("https://www.youtube.com/embed/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
        ];
        for (url, id) in cases {
            assert_eq!(m.extract_id(url), Some(id.to_string()), "{}", url);
        }
        assert_eq!(m.extract_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(m.extract_id("https://www.youtube.com/watch?v=dQw4w9WgXcQXYZ"), None);
        assert_eq!(m.extract_id("https://youtu.be/dQw4w9WgXcQ-1"), None);
        assert_eq!(m.extract_id("https://www.youtube.com/@channel"), None);
        assert_eq!(m.extract_id(""), None);
    }

    #[test]
    fn test_link_fragment_wins_over_text() {
        let m = LinkMatcher::for_platform(Platform::YouTube);
        let b = block(vec![
            Fragment::text("see https://youtu.be/YYYYYYYYYYY and "),
            Fragment::Link {
                url: "https://www.youtube.com/watch?v=XXXXXXXXXXX".into(),
                text: "this one".into(),
            },
        ]);
        let url = m.extract_url(&b).unwrap();
        assert_eq!(m.extract_id(&url), Some("XXXXXXXXXXX".into()));
    }

    #[test]
    fn test_plain_text_fallback() {
        let m = LinkMatcher::for_platform(Platform::Vimeo);
        let b = block(vec![Fragment::text("watch vimeo.com/123456 later")]);
        assert_eq!(m.extract_url(&b), Some("vimeo.com/123456".into()));

        let b = block(vec![Fragment::text("ends with https://youtu.be/dQw4w9WgXcQ")]);
        assert_eq!(
            LinkMatcher::for_platform(Platform::YouTube).extract_url(&b),
            Some("https://youtu.be/dQw4w9WgXcQ".into())
        );
    }

    #[test]
    fn test_no_platform_for_empty_or_unrelated_blocks() {
        assert!(detect_platform(&block(vec![])).is_none());
        assert!(detect_platform(&block(vec![Fragment::text("")])).is_none());
        assert!(detect_platform(&block(vec![Fragment::link("https://example.com/video/1")])).is_none());
    }

    #[test]
    fn test_priority_prefers_bilibili() {
        let b = block(vec![
            Fragment::link("https://vimeo.com/76979871"),
            Fragment::text(" and https://www.bilibili.com/video/BV1GJ411x7h7 "),
            Fragment::link("https://youtu.be/dQw4w9WgXcQ"),
        ]);
        let detection = detect_platform(&b).unwrap();
        assert_eq!(detection.platform, Platform::Bilibili);
        assert_eq!(detection.id, "BV1GJ411x7h7");

        let b = block(vec![
            Fragment::text("https://youtu.be/dQw4w9WgXcQ"),
            Fragment::text(" https://vimeo.com/76979871"),
        ]);
        assert_eq!(detect_platform(&b).unwrap().platform, Platform::Vimeo);
    }
}
