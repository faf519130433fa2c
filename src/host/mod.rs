//! Contract with the note editor that owns the document.
//!
//! The plugin never touches block storage directly. It reads blocks and issues
//! commands through [`HostEditor`], reads its settings through
//! [`SettingsStore`] and reports outcomes through [`Notifier`].

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SettingSpec, SettingValue};

pub use memory::{MemoryHost, MemoryNotifier, MemorySettings};

pub type BlockId = u64;
pub type RefId = u64;

/// One atomic piece of block content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "lowercase")]
pub enum Fragment {
    Text { value: String },
    Link { url: String, text: String },
}

impl Fragment {
    pub fn text(value: impl Into<String>) -> Self {
        Fragment::Text { value: value.into() }
    }

    pub fn link(url: impl Into<String>) -> Self {
        let url = url.into();
        Fragment::Link {
            text: url.clone(),
            url,
        }
    }

    /// The visible text of the fragment.
    pub fn display_text(&self) -> &str {
        match self {
            Fragment::Text { value } => value,
            Fragment::Link { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image { src: String },
    Video { src: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Date(NaiveDate),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Text,
    Date,
}

/// A value written on a tag reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl RefProperty {
    pub fn new(name: &str, value: PropertyValue) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// A property declared on a tag block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: PropertyKind,
    pub default: PropertyValue,
}

/// A tag attached to a block, pointing at the tag's own block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: RefId,
    pub alias: String,
    pub to: BlockId,
    pub data: Vec<RefProperty>,
}

impl TagRef {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.data.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub content: Vec<Fragment>,
    pub parent: Option<BlockId>,
    pub children: Vec<BlockId>,
    pub aliases: Vec<String>,
    pub refs: Vec<TagRef>,
    /// Blocks that tag this one.
    pub back_refs: Vec<BlockId>,
    pub properties: Vec<PropertyDescriptor>,
}

impl Block {
    pub fn new(id: BlockId, content: Vec<Fragment>) -> Self {
        Self {
            id,
            kind: BlockKind::Text,
            content,
            parent: None,
            children: Vec::new(),
            aliases: Vec::new(),
            refs: Vec::new(),
            back_refs: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Visible text of every fragment, concatenated in order.
    pub fn text(&self) -> String {
        self.content.iter().map(Fragment::display_text).collect()
    }

    pub fn link_urls(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|f| match f {
            Fragment::Link { url, .. } => Some(url.as_str()),
            Fragment::Text { .. } => None,
        })
    }

    pub fn tag_ref(&self, alias: &str) -> Option<&TagRef> {
        self.refs.iter().find(|r| r.alias == alias)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    FirstChild,
    LastChild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Success,
    Error,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("host rejected `{command}`: {reason}")]
pub struct HostError {
    pub command: &'static str,
    pub reason: String,
}

impl HostError {
    pub fn new(command: &'static str, reason: impl Into<String>) -> Self {
        Self {
            command,
            reason: reason.into(),
        }
    }
}

/// Document access and the editor commands the plugin issues.
#[async_trait]
pub trait HostEditor: Send + Sync {
    async fn block(&self, id: BlockId) -> Option<Block>;

    async fn block_id_by_alias(&self, alias: &str) -> Option<BlockId>;

    /// Every alias registered in the document with its block.
    async fn aliases(&self) -> Vec<(String, BlockId)>;

    /// Tags `block_id` with `alias`, creating the alias block if needed.
    /// Tagging a block twice with the same alias is a no-op.
    async fn insert_tag(&self, block_id: BlockId, alias: &str) -> Result<(), HostError>;

    async fn set_ref_data(&self, tag_ref: &TagRef, data: Vec<RefProperty>) -> Result<(), HostError>;

    async fn insert_block(
        &self,
        parent: Option<BlockId>,
        position: Position,
        content: Vec<Fragment>,
        kind: BlockKind,
    ) -> Result<BlockId, HostError>;

    async fn set_properties(
        &self,
        block_ids: &[BlockId],
        properties: Vec<PropertyDescriptor>,
    ) -> Result<(), HostError>;

    async fn delete_blocks(&self, block_ids: &[BlockId]) -> Result<(), HostError>;
}

/// Per-plugin key/value settings owned by the host.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn register(&self, schema: &[SettingSpec]) -> Result<(), HostError>;

    async fn get(&self, key: &str) -> Option<SettingValue>;
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// Sends notifications to the log. Used when there is no UI to show them.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Error => tracing::error!("{}", message),
            NotifyLevel::Info | NotifyLevel::Success => tracing::info!("{}", message),
        }
    }
}
