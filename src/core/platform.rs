use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::settings;

/// A supported video platform.
///
/// Detection walks [`Platform::PRIORITY`] in order and stops at the first
/// platform whose matcher recognizes the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Bilibili,
    Vimeo,
    YouTube,
}

impl Platform {
    pub const PRIORITY: [Platform; 3] = [Platform::Bilibili, Platform::Vimeo, Platform::YouTube];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Bilibili => "Bilibili",
            Platform::Vimeo => "Vimeo",
            Platform::YouTube => "YouTube",
        }
    }

    /// Alias of the long-lived tag block that carries this platform's properties.
    pub fn tag_alias(&self) -> &'static str {
        match self {
            Platform::Bilibili => "bilibili",
            Platform::Vimeo => "vimeo",
            Platform::YouTube => "youtube",
        }
    }

    /// Prepended to an author name to form the author tag alias.
    pub fn author_prefix(&self) -> &'static str {
        match self {
            Platform::Bilibili => "bilibili-up/",
            Platform::Vimeo => "vimeo-user/",
            Platform::YouTube => "youtube-channel/",
        }
    }

    pub fn author_tag(&self, author: &str) -> String {
        format!("{}{}", self.author_prefix(), author.trim())
    }

    /// Settings key of the credential that must be present before fetching.
    pub fn required_credential(&self) -> Option<&'static str> {
        match self {
            Platform::Vimeo => Some(settings::VIMEO_ACCESS_TOKEN),
            Platform::Bilibili | Platform::YouTube => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_tag_uses_platform_prefix() {
        assert_eq!(Platform::Bilibili.author_tag(" Creator1 "), "bilibili-up/Creator1");
        assert_eq!(Platform::YouTube.author_tag("Chan"), "youtube-channel/Chan");
    }

    #[test]
    fn test_only_vimeo_requires_credential() {
        assert!(Platform::Bilibili.required_credential().is_none());
        assert!(Platform::Vimeo.required_credential().is_some());
        assert!(Platform::YouTube.required_credential().is_none());
    }
}
