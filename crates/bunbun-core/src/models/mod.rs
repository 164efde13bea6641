//! Domain models
//!
//! This module contains the data types exchanged between the host, the
//! upload sync hook and the Bunny Stream API.

pub mod attachment;
pub mod credentials;
pub mod sync;
pub mod video;

pub use attachment::{AttachmentId, UploadTarget};
pub use credentials::Credentials;
pub use sync::{SkipReason, SyncOutcome, SyncResult};
pub use video::{VideoRecord, VideoStatus};
