//! In-process host used by the command-line harness and the tests.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::{
    Block, BlockId, BlockKind, Fragment, HostEditor, HostError, Notifier, NotifyLevel, Position,
    PropertyDescriptor, RefId, RefProperty, SettingsStore, TagRef,
};
use crate::config::{SettingSpec, SettingValue};

#[derive(Debug, Default, Serialize)]
pub struct Document {
    pub roots: Vec<BlockId>,
    pub blocks: BTreeMap<BlockId, Block>,
    pub aliases: BTreeMap<String, BlockId>,
    #[serde(skip)]
    next_block: BlockId,
    #[serde(skip)]
    next_ref: RefId,
}

impl Document {
    fn allocate_block(&mut self) -> BlockId {
        self.next_block += 1;
        self.next_block
    }

    fn allocate_ref(&mut self) -> RefId {
        self.next_ref += 1;
        self.next_ref
    }

    fn add_root(&mut self, content: Vec<Fragment>) -> BlockId {
        let id = self.allocate_block();
        self.blocks.insert(id, Block::new(id, content));
        self.roots.push(id);
        id
    }

    fn remove_tree(&mut self, id: BlockId, removed: &mut Vec<BlockId>) {
        let Some(block) = self.blocks.remove(&id) else {
            return;
        };
        removed.push(id);
        for child in block.children {
            self.remove_tree(child, removed);
        }
    }
}

fn place(siblings: &mut Vec<BlockId>, position: Position, id: BlockId) {
    match position {
        Position::FirstChild => siblings.insert(0, id),
        Position::LastChild => siblings.push(id),
    }
}

/// A document held in memory behind a mutex.
#[derive(Default)]
pub struct MemoryHost {
    doc: Mutex<Document>,
    rejected: Mutex<HashSet<&'static str>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a top-level block and returns its id.
    pub fn add_block(&self, content: Vec<Fragment>) -> BlockId {
        self.lock().add_root(content)
    }

    /// Makes every later call of `command` fail.
    pub fn reject(&self, command: &'static str) {
        self.rejected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(command);
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(&*self.lock()).unwrap_or(serde_json::Value::Null)
    }

    /// Every block below `id`, depth first.
    pub fn descendants(&self, id: BlockId) -> Vec<Block> {
        let doc = self.lock();
        let mut out = Vec::new();
        let mut stack: Vec<BlockId> = doc
            .blocks
            .get(&id)
            .map(|b| b.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(block) = doc.blocks.get(&next) {
                stack.extend(block.children.iter().rev().copied());
                out.push(block.clone());
            }
        }
        out
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self, command: &'static str) -> Result<(), HostError> {
        let rejected = self.rejected.lock().unwrap_or_else(|e| e.into_inner());
        if rejected.contains(command) {
            return Err(HostError::new(command, "rejected by host"));
        }
        Ok(())
    }
}

#[async_trait]
impl HostEditor for MemoryHost {
    async fn block(&self, id: BlockId) -> Option<Block> {
        self.lock().blocks.get(&id).cloned()
    }

    async fn block_id_by_alias(&self, alias: &str) -> Option<BlockId> {
        self.lock().aliases.get(alias).copied()
    }

    async fn aliases(&self) -> Vec<(String, BlockId)> {
        self.lock()
            .aliases
            .iter()
            .map(|(alias, id)| (alias.clone(), *id))
            .collect()
    }

    async fn insert_tag(&self, block_id: BlockId, alias: &str) -> Result<(), HostError> {
        self.check("insertTag")?;
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(HostError::new("insertTag", "empty alias"));
        }
        let mut doc = self.lock();
        if !doc.blocks.contains_key(&block_id) {
            return Err(HostError::new("insertTag", format!("block {} not found", block_id)));
        }

        let target = match doc.aliases.get(alias).copied() {
            Some(id) => id,
            None => {
                let id = doc.add_root(vec![Fragment::text(alias)]);
                if let Some(block) = doc.blocks.get_mut(&id) {
                    block.aliases.push(alias.to_string());
                }
                doc.aliases.insert(alias.to_string(), id);
                id
            }
        };

        let already_tagged = doc
            .blocks
            .get(&block_id)
            .is_some_and(|b| b.tag_ref(alias).is_some());
        if already_tagged {
            return Ok(());
        }

        let ref_id = doc.allocate_ref();
        if let Some(block) = doc.blocks.get_mut(&block_id) {
            block.refs.push(TagRef {
                id: ref_id,
                alias: alias.to_string(),
                to: target,
                data: Vec::new(),
            });
        }
        if let Some(tag_block) = doc.blocks.get_mut(&target) {
            tag_block.back_refs.push(block_id);
        }
        Ok(())
    }

    async fn set_ref_data(&self, tag_ref: &TagRef, data: Vec<RefProperty>) -> Result<(), HostError> {
        self.check("setRefData")?;
        let mut doc = self.lock();
        let existing = doc
            .blocks
            .values_mut()
            .flat_map(|b| b.refs.iter_mut())
            .find(|r| r.id == tag_ref.id)
            .ok_or_else(|| HostError::new("setRefData", format!("ref {} not found", tag_ref.id)))?;

        for property in data {
            match existing.data.iter_mut().find(|p| p.name == property.name) {
                Some(slot) => slot.value = property.value,
                None => existing.data.push(property),
            }
        }
        Ok(())
    }

    async fn insert_block(
        &self,
        parent: Option<BlockId>,
        position: Position,
        content: Vec<Fragment>,
        kind: BlockKind,
    ) -> Result<BlockId, HostError> {
        self.check("insertBlock")?;
        let mut doc = self.lock();
        if let Some(parent) = parent {
            if !doc.blocks.contains_key(&parent) {
                return Err(HostError::new("insertBlock", format!("parent {} not found", parent)));
            }
        }

        let id = doc.allocate_block();
        let mut block = Block::new(id, content);
        block.kind = kind;
        block.parent = parent;
        doc.blocks.insert(id, block);

        let doc = &mut *doc;
        match parent {
            Some(parent) => {
                if let Some(parent_block) = doc.blocks.get_mut(&parent) {
                    place(&mut parent_block.children, position, id);
                }
            }
            None => place(&mut doc.roots, position, id),
        }
        Ok(id)
    }

    async fn set_properties(
        &self,
        block_ids: &[BlockId],
        properties: Vec<PropertyDescriptor>,
    ) -> Result<(), HostError> {
        self.check("setProperties")?;
        let mut doc = self.lock();
        for id in block_ids {
            let block = doc
                .blocks
                .get_mut(id)
                .ok_or_else(|| HostError::new("setProperties", format!("block {} not found", id)))?;
            for property in &properties {
                match block.properties.iter_mut().find(|p| p.name == property.name) {
                    Some(slot) => *slot = property.clone(),
                    None => block.properties.push(property.clone()),
                }
            }
        }
        Ok(())
    }

    async fn delete_blocks(&self, block_ids: &[BlockId]) -> Result<(), HostError> {
        self.check("deleteBlocks")?;
        let mut doc = self.lock();
        let mut removed = Vec::new();
        for id in block_ids {
            doc.remove_tree(*id, &mut removed);
        }

        let removed: HashSet<BlockId> = removed.into_iter().collect();
        doc.roots.retain(|id| !removed.contains(id));
        doc.aliases.retain(|_, id| !removed.contains(id));
        for block in doc.blocks.values_mut() {
            block.children.retain(|id| !removed.contains(id));
            block.refs.retain(|r| !removed.contains(&r.to));
            block.back_refs.retain(|id| !removed.contains(id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, SettingValue>>,
    schema: Mutex<Vec<SettingSpec>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: SettingValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: SettingValue) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    pub fn registered_keys(&self) -> Vec<&'static str> {
        self.schema
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|s| s.key)
            .collect()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn register(&self, schema: &[SettingSpec]) -> Result<(), HostError> {
        *self.schema.lock().unwrap_or_else(|e| e.into_inner()) = schema.to_vec();
        Ok(())
    }

    async fn get(&self, key: &str) -> Option<SettingValue> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

/// Records every notification for later inspection.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(NotifyLevel, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(NotifyLevel, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((level, message.to_string()));
    }
}
