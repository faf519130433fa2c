use crate::core::Platform;
use crate::host::{BlockId, HostEditor, HostError};

/// Deletes author tag blocks that no block refers to any more.
///
/// Only aliases carrying one of the platform author prefixes are considered;
/// platform tag blocks are never touched.
pub async fn remove_orphan_author_tags(host: &dyn HostEditor) -> Result<Vec<BlockId>, HostError> {
    let mut orphans = Vec::new();
    for (alias, id) in host.aliases().await {
        let is_author_tag = Platform::PRIORITY
            .iter()
            .any(|p| alias.starts_with(p.author_prefix()));
        if !is_author_tag {
            continue;
        }
        match host.block(id).await {
            Some(block) if block.back_refs.is_empty() => {
                tracing::debug!("Author tag #{} has no references", alias);
                orphans.push(id);
            }
            _ => {}
        }
    }

    if !orphans.is_empty() {
        host.delete_blocks(&orphans).await?;
    }
    Ok(orphans)
}
