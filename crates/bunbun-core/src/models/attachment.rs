use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque identifier of a host attachment record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for AttachmentId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for AttachmentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AttachmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Read-only view of the attachment being synchronized.
///
/// Owned by the host media store; the sync never mutates the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub local_file_path: PathBuf,
    pub mime_type: String,
}

/// Substring match on "video", case-insensitive. No magic-byte sniffing.
pub fn is_video_mime(mime_type: &str) -> bool {
    mime_type.to_ascii_lowercase().contains("video")
}
