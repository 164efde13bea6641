//! BunBun plugin implementations
//!
//! The Bunny Stream provider client, the upload sync hook that drives it on
//! "attachment created" events, the hook registry the host dispatches those
//! events through, and the front-end playback field filter.

mod bunny_stream;
mod playback_filter;
mod plugin;
mod registry;
pub mod retry;
mod upload_sync;

pub use bunny_stream::{build_http_client, BunnyStreamClient};
pub use playback_filter::PlaybackFieldFilter;
pub use plugin::{AttachmentHook, HookInfo, HookReport};
pub use registry::HookRegistry;
pub use retry::RetryPolicy;
pub use upload_sync::UploadSyncHandler;
