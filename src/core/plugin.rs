use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::config::{settings_schema, Config, PluginSettings};
use crate::core::annotator::{ensure_tag_schema, AnnotationReport, AnnotationWriter};
use crate::core::cleanup::remove_orphan_author_tags;
use crate::core::{ExtractorEngine, PipelineError, Platform};
use crate::host::{BlockId, HostEditor, HostError, Notifier, NotifyLevel, SettingsStore};

/// How a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Content was pasted into the block. Blocks without links are ignored.
    Paste,
    ContextMenu,
    Command,
}

impl Trigger {
    fn expects_link(&self) -> bool {
        !matches!(self, Trigger::Paste)
    }
}

/// State that lives from load to unload.
#[derive(Debug, Default)]
struct SessionState {
    schema_ready: HashSet<Platform>,
    /// Latest paste ticket per block. A paste only runs if it still holds the
    /// latest ticket once its delay has passed.
    pastes: HashMap<BlockId, u64>,
}

/// The loaded plugin: the host handles, the extractor clients and the
/// session state. Dropped on unload.
pub struct Plugin {
    config: Config,
    engine: ExtractorEngine,
    host: Arc<dyn HostEditor>,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
}

impl Plugin {
    pub async fn load(
        config: Config,
        host: Arc<dyn HostEditor>,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let engine = ExtractorEngine::with_defaults(&config)?;
        Self::load_with_engine(config, engine, host, settings, notifier).await
    }

    pub async fn load_with_engine(
        config: Config,
        engine: ExtractorEngine,
        host: Arc<dyn HostEditor>,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        settings.register(&settings_schema()).await?;
        tracing::info!("Loaded vidtag v{}", env!("CARGO_PKG_VERSION"));
        Ok(Self {
            config,
            engine,
            host,
            settings,
            notifier,
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn unload(self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        tracing::info!("Unloading vidtag ({} tag schemas initialized)", state.schema_ready.len());
        state.schema_ready.clear();
        state.pastes.clear();
    }

    pub fn host(&self) -> &Arc<dyn HostEditor> {
        &self.host
    }

    /// Runs the pipeline for one block and sends at most one notification.
    /// Nothing is sent when a pasted block holds no link, or when a newer
    /// paste on the same block arrives within the paste delay.
    pub async fn handle(&self, trigger: Trigger, block_id: BlockId) -> Result<AnnotationReport, PipelineError> {
        if trigger == Trigger::Paste && !self.debounce_paste(block_id).await {
            tracing::debug!("Paste on block {} superseded by a newer paste", block_id);
            return Err(PipelineError::Superseded);
        }

        let result = self.run(trigger, block_id).await;
        match &result {
            Ok(report) => self.notifier.notify(NotifyLevel::Success, &report.summary()),
            Err(e) => {
                if let PipelineError::Host(cause) = e {
                    tracing::error!("Annotating block {} failed: {}", block_id, cause);
                }
                if let Some(message) = e.user_message() {
                    self.notifier.notify(NotifyLevel::Error, &message);
                }
            }
        }
        result
    }

    /// Waits out the paste delay. Returns false if another paste on the
    /// block came in meanwhile.
    async fn debounce_paste(&self, block_id: BlockId) -> bool {
        let delay = self.config.paste_delay();
        if delay.is_zero() {
            return true;
        }

        let ticket = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let latest = state.pastes.entry(block_id).or_default();
            *latest += 1;
            *latest
        };
        tokio::time::sleep(delay).await;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.pastes.get(&block_id) != Some(&ticket) {
            return false;
        }
        state.pastes.remove(&block_id);
        true
    }

    async fn run(&self, trigger: Trigger, block_id: BlockId) -> Result<AnnotationReport, PipelineError> {
        let not_found = || {
            if trigger.expects_link() {
                PipelineError::UnsupportedPlatform
            } else {
                PipelineError::NoLink
            }
        };

        let block = self.host.block(block_id).await.ok_or_else(not_found)?;
        let detection = self.engine.detect(&block).ok_or_else(not_found)?;

        let settings = PluginSettings::read(self.settings.as_ref()).await;
        if let Some(setting) = detection.platform.required_credential() {
            if !settings.credentials.has_required(detection.platform) {
                return Err(PipelineError::MissingCredential {
                    platform: detection.platform,
                    setting,
                });
            }
        }

        let info = self.engine.fetch(&detection, &settings.credentials).await;
        if info.cover_url.is_none() {
            return Err(PipelineError::FetchFailed {
                platform: detection.platform,
                id: detection.id,
            });
        }

        self.ensure_schema(detection.platform).await?;

        AnnotationWriter::new(self.host.as_ref(), self.config.settle_delay())
            .annotate(block_id, &info, detection.platform, &settings.annotate_options())
            .await
    }

    async fn ensure_schema(&self, platform: Platform) -> Result<(), PipelineError> {
        if self.schema_ready(platform) {
            return Ok(());
        }
        ensure_tag_schema(self.host.as_ref(), platform).await?;
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .schema_ready
            .insert(platform);
        Ok(())
    }

    fn schema_ready(&self, platform: Platform) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .schema_ready
            .contains(&platform)
    }

    /// Deletes author tags nothing points at and reports the count.
    pub async fn remove_orphan_author_tags(&self) -> Result<Vec<BlockId>, HostError> {
        match remove_orphan_author_tags(self.host.as_ref()).await {
            Ok(removed) => {
                self.notifier.notify(
                    NotifyLevel::Info,
                    &format!("Removed {} unused author tags", removed.len()),
                );
                Ok(removed)
            }
            Err(e) => {
                tracing::error!("Author tag cleanup failed: {}", e);
                self.notifier
                    .notify(NotifyLevel::Error, "Failed to remove unused author tags");
                Err(e)
            }
        }
    }
}
