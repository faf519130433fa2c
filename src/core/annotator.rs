//! Writes fetched metadata back into the host document.

use serde::Serialize;
use std::time::Duration;

use crate::core::{PipelineError, Platform, VideoInfo};
use crate::host::{
    BlockId, BlockKind, HostEditor, Position, PropertyDescriptor, PropertyKind, PropertyValue,
    RefProperty,
};

pub const PROP_IMG: &str = "img";
pub const PROP_TAGS: &str = "tags";
pub const PROP_PUBLISH_DATE: &str = "publishDate";
pub const PROP_PUBLISH_DATE_TEXT: &str = "publishDateText";

/// Properties declared on every platform tag block.
pub fn tag_schema() -> Vec<PropertyDescriptor> {
    let text = |name: &str| PropertyDescriptor {
        name: name.to_string(),
        kind: PropertyKind::Text,
        default: PropertyValue::Text(String::new()),
    };
    vec![
        text(PROP_IMG),
        text(PROP_TAGS),
        PropertyDescriptor {
            name: PROP_PUBLISH_DATE.to_string(),
            kind: PropertyKind::Date,
            default: PropertyValue::Empty,
        },
        text(PROP_PUBLISH_DATE_TEXT),
    ]
}

/// Finds or creates the platform's tag block and declares any missing
/// properties on it. Returns the tag block id.
pub async fn ensure_tag_schema(host: &dyn HostEditor, platform: Platform) -> Result<BlockId, PipelineError> {
    let alias = platform.tag_alias();
    let tag_block = match host.block_id_by_alias(alias).await {
        Some(id) => id,
        None => {
            tracing::info!("Creating tag block #{}", alias);
            let seed = host
                .insert_block(None, Position::LastChild, Vec::new(), BlockKind::Text)
                .await?;
            host.insert_tag(seed, alias).await?;
            host.block_id_by_alias(alias).await.ok_or_else(|| {
                PipelineError::Host(crate::host::HostError::new(
                    "insertTag",
                    format!("alias {} did not resolve after creation", alias),
                ))
            })?
        }
    };

    let declared = host.block(tag_block).await;
    let missing: Vec<PropertyDescriptor> = tag_schema()
        .into_iter()
        .filter(|p| !declared.as_ref().is_some_and(|b| b.has_property(&p.name)))
        .collect();
    if !missing.is_empty() {
        host.set_properties(&[tag_block], missing).await?;
    }
    Ok(tag_block)
}

/// Which publish-date property is written first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRepr {
    Date,
    Text,
}

#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub insert_image: bool,
    pub insert_video: bool,
    pub primary_date: DateRepr,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            insert_image: true,
            insert_video: false,
            primary_date: DateRepr::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertOutcome {
    Disabled,
    Unavailable,
    AlreadyPresent,
    Inserted(BlockId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationReport {
    pub platform: Platform,
    pub block_id: BlockId,
    pub properties_written: bool,
    pub tag_count: usize,
    pub publish_date: Option<String>,
    pub image: InsertOutcome,
    pub video: InsertOutcome,
    pub author_tag: Option<String>,
}

impl AnnotationReport {
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("tagged #{}", self.platform.tag_alias())];
        if self.properties_written {
            parts.push(format!("{} tags", self.tag_count));
            if let Some(date) = &self.publish_date {
                parts.push(format!("published {}", date));
            }
        }
        match self.image {
            InsertOutcome::Inserted(_) => parts.push("cover inserted".to_string()),
            InsertOutcome::AlreadyPresent => parts.push("cover already present".to_string()),
            InsertOutcome::Disabled | InsertOutcome::Unavailable => {}
        }
        if let InsertOutcome::Inserted(_) = self.video {
            parts.push("video inserted".to_string());
        }
        if let Some(author) = &self.author_tag {
            parts.push(format!("author #{}", author));
        }
        format!("{}: {}", self.platform, parts.join(", "))
    }
}

pub struct AnnotationWriter<'a> {
    host: &'a dyn HostEditor,
    settle_delay: Duration,
}

impl<'a> AnnotationWriter<'a> {
    pub fn new(host: &'a dyn HostEditor, settle_delay: Duration) -> Self {
        Self { host, settle_delay }
    }

    /// Tags the block, writes the tag properties, inserts the cover and
    /// video blocks and tags the author. Steps run strictly in order; the
    /// first host rejection stops the run and earlier writes are kept.
    pub async fn annotate(
        &self,
        block_id: BlockId,
        info: &VideoInfo,
        platform: Platform,
        options: &AnnotateOptions,
    ) -> Result<AnnotationReport, PipelineError> {
        let alias = platform.tag_alias();
        self.host.insert_tag(block_id, alias).await?;

        // the new ref is not visible until the host has applied the insert
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        let tag_ref = self
            .host
            .block(block_id)
            .await
            .and_then(|b| b.tag_ref(alias).cloned());

        let properties_written = match &tag_ref {
            Some(tag_ref) => {
                self.host
                    .set_ref_data(tag_ref, Self::ref_data(info, options.primary_date))
                    .await?;
                true
            }
            None => {
                tracing::warn!("Tag #{} not found on block {} after insert", alias, block_id);
                false
            }
        };

        let image = match (&info.cover_url, options.insert_image) {
            (_, false) => InsertOutcome::Disabled,
            (None, true) => InsertOutcome::Unavailable,
            (Some(cover), true) => {
                self.insert_media(block_id, BlockKind::Image { src: cover.to_string() })
                    .await?
            }
        };

        let video = match (&info.embed_url, options.insert_video) {
            (_, false) => InsertOutcome::Disabled,
            (None, true) => InsertOutcome::Unavailable,
            (Some(embed), true) => {
                self.insert_media(block_id, BlockKind::Video { src: embed.to_string() })
                    .await?
            }
        };

        let author_tag = match info.author_name.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => {
                let tag = platform.author_tag(author);
                self.host.insert_tag(block_id, &tag).await?;
                Some(tag)
            }
            _ => None,
        };

        let report = AnnotationReport {
            platform,
            block_id,
            properties_written,
            tag_count: info.tags.len(),
            publish_date: info.publish_date_text(),
            image,
            video,
            author_tag,
        };
        tracing::info!("Annotated block {}: {}", block_id, report.summary());
        Ok(report)
    }

    fn ref_data(info: &VideoInfo, primary: DateRepr) -> Vec<RefProperty> {
        if info.tags.iter().any(|t| t.contains('|')) {
            tracing::warn!("Tag names containing '|' will not split back cleanly: {:?}", info.tags);
        }

        let img = info
            .cover_url
            .as_ref()
            .map_or(PropertyValue::Empty, |u| PropertyValue::Text(u.to_string()));
        let date = info.publish_date.map_or(PropertyValue::Empty, PropertyValue::Date);
        let date_text = info
            .publish_date_text()
            .map_or(PropertyValue::Empty, PropertyValue::Text);

        let mut data = vec![
            RefProperty::new(PROP_IMG, img),
            RefProperty::new(PROP_TAGS, PropertyValue::Text(info.joined_tags())),
        ];
        let date = RefProperty::new(PROP_PUBLISH_DATE, date);
        let date_text = RefProperty::new(PROP_PUBLISH_DATE_TEXT, date_text);
        match primary {
            DateRepr::Date => data.extend([date, date_text]),
            DateRepr::Text => data.extend([date_text, date]),
        }
        data
    }

    /// Inserts a media child unless the same media already sits somewhere
    /// below the block.
    async fn insert_media(&self, block_id: BlockId, kind: BlockKind) -> Result<InsertOutcome, PipelineError> {
        if self.has_descendant(block_id, &kind).await {
            tracing::debug!("Block {} already holds {:?}", block_id, kind);
            return Ok(InsertOutcome::AlreadyPresent);
        }
        let id = self
            .host
            .insert_block(Some(block_id), Position::LastChild, Vec::new(), kind)
            .await?;
        Ok(InsertOutcome::Inserted(id))
    }

    async fn has_descendant(&self, root: BlockId, kind: &BlockKind) -> bool {
        let mut stack = match self.host.block(root).await {
            Some(block) => block.children,
            None => return false,
        };
        while let Some(id) = stack.pop() {
            if let Some(block) = self.host.block(id).await {
                if &block.kind == kind {
                    return true;
                }
                stack.extend(block.children);
            }
        }
        false
    }
}
