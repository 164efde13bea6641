//! Attachment hook abstraction
//!
//! A hook is invoked by the host after a new attachment has been stored.
//! Hooks have no failure channel towards the host: whatever happens is
//! reported in the returned `SyncOutcome`.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use bunbun_core::{AttachmentId, SyncOutcome};

/// Trait that all attachment hooks must implement
#[async_trait]
pub trait AttachmentHook: Send + Sync + Debug {
    /// Get the hook name/identifier
    fn name(&self) -> &str;

    /// Handle a newly created attachment
    async fn on_attachment_created(&self, attachment_id: &AttachmentId) -> SyncOutcome;
}

/// Hook information for listing registered hooks
#[derive(Debug, Clone, Serialize)]
pub struct HookInfo {
    /// Hook name/identifier
    pub name: String,
    /// Human-readable description
    pub description: String,
}

/// Outcome of one hook for one dispatched event
#[derive(Debug)]
pub struct HookReport {
    pub hook: String,
    pub outcome: SyncOutcome,
}
