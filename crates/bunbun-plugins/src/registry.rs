//! Hook registry: the event source the host dispatches attachment events through

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

use bunbun_core::{AttachmentId, SyncError, SyncOutcome};

use crate::plugin::{AttachmentHook, HookInfo, HookReport};

/// Registry of attachment hooks.
///
/// Hooks run in registration order. Each one runs in its own task, so a hook
/// that panics is reported as failed and never reaches the host or the
/// hooks after it.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Arc<RwLock<Vec<(Arc<dyn AttachmentHook>, HookInfo)>>>,
}

impl HookRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            hooks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a hook. Names must be unique.
    pub async fn register(&self, hook: Arc<dyn AttachmentHook>, info: HookInfo) -> Result<()> {
        let mut hooks = self.hooks.write().await;

        if hooks.iter().any(|(h, _)| h.name() == hook.name()) {
            anyhow::bail!("Hook '{}' is already registered", hook.name());
        }

        hooks.push((hook, info));
        Ok(())
    }

    /// Get a hook by name
    pub async fn get(&self, name: &str) -> Result<Arc<dyn AttachmentHook>> {
        let hooks = self.hooks.read().await;

        hooks
            .iter()
            .find(|(h, _)| h.name() == name)
            .map(|(h, _)| h.clone())
            .with_context(|| format!("Hook '{}' not found", name))
    }

    /// List all registered hooks in dispatch order
    pub async fn list(&self) -> Vec<HookInfo> {
        let hooks = self.hooks.read().await;

        hooks.iter().map(|(_, info)| info.clone()).collect()
    }

    /// Check if a hook is registered
    pub async fn contains(&self, name: &str) -> bool {
        let hooks = self.hooks.read().await;

        hooks.iter().any(|(h, _)| h.name() == name)
    }

    /// Dispatch an "attachment created" event to every registered hook.
    pub async fn dispatch_attachment_created(&self, attachment_id: &AttachmentId) -> Vec<HookReport> {
        // Snapshot so registration is not blocked while hooks run.
        let hooks: Vec<Arc<dyn AttachmentHook>> = self
            .hooks
            .read()
            .await
            .iter()
            .map(|(h, _)| h.clone())
            .collect();

        let mut reports = Vec::with_capacity(hooks.len());
        for hook in hooks {
            let name = hook.name().to_string();
            let id = attachment_id.clone();

            let task = tokio::spawn(async move { hook.on_attachment_created(&id).await });
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    tracing::error!(
                        hook = %name,
                        attachment_id = %attachment_id,
                        error = %join_error,
                        "Attachment hook aborted"
                    );
                    SyncOutcome::Failed(SyncError::Internal(format!(
                        "Hook '{}' aborted: {}",
                        name, join_error
                    )))
                }
            };

            reports.push(HookReport {
                hook: name,
                outcome,
            });
        }

        reports
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
