//! BunBun Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! collaborator traits shared by the Bunny Stream provider client, the upload
//! sync hook and the CLI.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod playback_url;

// Re-export commonly used types
pub use config::{StreamConfig, API_KEY_KEY, CDN_HOSTNAME_KEY, LIBRARY_ID_KEY, VIDEO_ID_META_KEY};
pub use error::{SyncError, SyncResultExt};
pub use hooks::{
    EnvSettingsStore, InMemoryMediaStore, MediaStore, MemorySettingsStore, SettingsStore,
    StoredAttachment,
};
pub use models::{
    AttachmentId, Credentials, SkipReason, SyncOutcome, SyncResult, UploadTarget, VideoRecord,
    VideoStatus,
};
pub use playback_url::{PlaybackHost, PlaybackUrlBuilder};
