use thiserror::Error;

use crate::core::Platform;
use crate::host::HostError;

/// Why a pipeline run stopped without annotating.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Nothing to do; never shown to the user.
    #[error("no video link found")]
    NoLink,

    /// A newer paste on the same block replaced this one; never shown.
    #[error("paste superseded by a newer paste")]
    Superseded,

    #[error("No supported video link found in this block")]
    UnsupportedPlatform,

    #[error("{platform} needs the `{setting}` setting before it can be used")]
    MissingCredential {
        platform: Platform,
        setting: &'static str,
    },

    #[error("Could not fetch {platform} video info for {id}")]
    FetchFailed { platform: Platform, id: String },

    #[error(transparent)]
    Host(#[from] HostError),
}

impl PipelineError {
    /// Text shown to the user, or `None` when the run should stay silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            PipelineError::NoLink | PipelineError::Superseded => None,
            PipelineError::Host(_) => Some("Failed to write video info to the block".to_string()),
            other => Some(other.to_string()),
        }
    }
}
