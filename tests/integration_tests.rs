use anyhow::Result;
use vidtag::config::Config;
use vidtag::core::{Extractor, ExtractorEngine, Platform};
use vidtag::extractors::{detect_platform, LinkMatcher};
use vidtag::host::{Block, Fragment};

#[tokio::test]
async fn test_extractor_engine_initialization() -> Result<()> {
    let engine = ExtractorEngine::with_defaults(&Config::default())?;

    // One client per platform, in priority order
    let platforms: Vec<Platform> = engine.extractors.iter().map(|e| e.platform()).collect();
    assert_eq!(platforms, Platform::PRIORITY.to_vec());
    Ok(())
}

#[tokio::test]
async fn test_matchers_recognize_their_platform() -> Result<()> {
    let youtube = LinkMatcher::for_platform(Platform::YouTube);
    assert!(youtube.matches("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    assert!(youtube.matches("https://youtu.be/dQw4w9WgXcQ"));
    assert!(!youtube.matches("https://vimeo.com/123456"));
    assert!(!youtube.matches("https://example.com"));

    let vimeo = LinkMatcher::for_platform(Platform::Vimeo);
    assert!(vimeo.matches("https://vimeo.com/123456"));
    assert!(!vimeo.matches("https://www.bilibili.com/video/BV1GJ411x7h7"));

    let bilibili = LinkMatcher::for_platform(Platform::Bilibili);
    assert!(bilibili.matches("https://www.bilibili.com/video/BV1GJ411x7h7"));
    assert!(!bilibili.matches("https://youtu.be/dQw4w9WgXcQ"));
    Ok(())
}

#[tokio::test]
async fn test_video_id_extraction() -> Result<()> {
    let test_cases = vec![
        (Platform::YouTube, "https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
        (Platform::YouTube, "https://youtu.be/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
        (Platform::YouTube, "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=123", "dQw4w9WgXcQ"),
        (Platform::Vimeo, "https://player.vimeo.com/video/76979871", "76979871"),
        (Platform::Bilibili, "https://www.bilibili.com/video/BV1GJ411x7h7/?spm_id_from=333", "BV1GJ411x7h7"),
    ];

    for (platform, url, expected_id) in test_cases {
        let id = LinkMatcher::for_platform(platform).extract_id(url);
        assert_eq!(id, Some(expected_id.to_string()), "{}", url);
    }
    Ok(())
}

#[test]
fn test_detection_uses_link_target_not_display_text() {
    let block = Block::new(
        7,
        vec![Fragment::Link {
            url: "https://vimeo.com/76979871".into(),
            text: "https://youtu.be/dQw4w9WgXcQ".into(),
        }],
    );

    // vimeo outranks youtube and the link target is what counts
    let detection = detect_platform(&block).unwrap();
    assert_eq!(detection.platform, Platform::Vimeo);
    assert_eq!(detection.id, "76979871");
    assert_eq!(detection.url, "https://vimeo.com/76979871");
}

#[test]
fn test_non_video_blocks_detect_nothing() {
    for content in [
        vec![],
        vec![Fragment::text("just some notes")],
        vec![Fragment::link("https://example.com/watch?v=dQw4w9WgXcQ")],
    ] {
        assert!(detect_platform(&Block::new(1, content)).is_none());
    }
}
