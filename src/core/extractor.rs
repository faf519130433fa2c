use crate::config::{Config, Credentials};
use crate::core::{Platform, VideoInfo};
use crate::extractors::{detect_platform, BilibiliExtractor, Detection, VimeoExtractor, YouTubeExtractor};
use crate::host::Block;
use anyhow::Result;
use async_trait::async_trait;

/// A metadata client for one platform.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn platform(&self) -> Platform;
    async fn extract(&self, id: &str, credentials: &Credentials) -> Result<VideoInfo>;
}

pub struct ExtractorEngine {
    pub extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorEngine {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Engine with a client for every supported platform.
    pub fn with_defaults(config: &Config) -> Result<Self> {
        let mut engine = Self::new();
        engine.register_extractor(Box::new(BilibiliExtractor::new(config)?));
        engine.register_extractor(Box::new(VimeoExtractor::new(config)?));
        engine.register_extractor(Box::new(YouTubeExtractor::new(config)?));
        Ok(engine)
    }

    pub fn register_extractor(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.push(extractor);
    }

    pub fn detect(&self, block: &Block) -> Option<Detection> {
        detect_platform(block)
    }

    /// Fetches metadata for a detected link. Never fails: any error is logged
    /// and an empty [`VideoInfo`] comes back instead.
    pub async fn fetch(&self, detection: &Detection, credentials: &Credentials) -> VideoInfo {
        let Some(extractor) = self
            .extractors
            .iter()
            .find(|e| e.platform() == detection.platform)
        else {
            tracing::warn!("No extractor registered for {}", detection.platform);
            return VideoInfo::default();
        };

        match extractor.extract(&detection.id, credentials).await {
            Ok(info) => {
                tracing::debug!("Fetched {} metadata for {}: {:?}", detection.platform, detection.id, info);
                info
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {} metadata for {}: {:#}", detection.platform, detection.id, e);
                VideoInfo::default()
            }
        }
    }
}

impl Default for ExtractorEngine {
    fn default() -> Self {
        Self::new()
    }
}
