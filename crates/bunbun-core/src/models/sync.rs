use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Result of one completed attachment sync.
///
/// Transient: the video id is written into attachment metadata and the value
/// is then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub video_id: String,
    /// Whether the record could be re-fetched after upload
    pub verified: bool,
}

/// Why an attachment event produced no remote video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// API key or library ID not configured
    MissingCredentials,
    /// MIME type does not indicate a video
    NotVideo,
    /// The attachment already carries a provider video id
    AlreadySynced,
}

/// Outcome of handling one "attachment created" event.
///
/// Events never fail towards the host: errors are logged at the hook
/// boundary and reported here instead.
#[derive(Debug)]
pub enum SyncOutcome {
    Synced(SyncResult),
    Skipped(SkipReason),
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }

    pub fn video_id(&self) -> Option<&str> {
        match self {
            SyncOutcome::Synced(result) => Some(&result.video_id),
            _ => None,
        }
    }
}
