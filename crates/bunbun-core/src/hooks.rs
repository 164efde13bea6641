//! Hooks and traits for host integration
//!
//! The sync core never talks to the host application directly. The host
//! provides its option storage and its attachment/metadata storage through
//! these traits, which keeps the core testable without a host runtime.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::AttachmentId;

/// Host key-value option store (API key, library ID, CDN hostname).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a single option. Blank values are reported as `None`.
    async fn get_option(&self, key: &str) -> Result<Option<String>>;
}

/// Host attachment storage and metadata store.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// MIME type recorded for the attachment
    async fn mime_type(&self, id: &AttachmentId) -> Result<Option<String>>;

    /// Absolute path of the stored file on local disk
    async fn attached_file(&self, id: &AttachmentId) -> Result<Option<PathBuf>>;

    /// Human title of the attachment, if the host has one
    async fn title(&self, id: &AttachmentId) -> Result<Option<String>>;

    /// Read one metadata value
    async fn get_metadata(&self, id: &AttachmentId, key: &str) -> Result<Option<String>>;

    /// Write one metadata value, replacing any previous value
    async fn update_metadata(&self, id: &AttachmentId, key: &str, value: &str) -> Result<()>;
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Options read from environment variables.
///
/// `bun_api_key` maps to `BUN_API_KEY`, and so on.
#[derive(Debug, Clone, Default)]
pub struct EnvSettingsStore;

impl EnvSettingsStore {
    pub fn new() -> Self {
        Self
    }

    pub fn env_var_name(key: &str) -> String {
        key.to_ascii_uppercase()
    }
}

#[async_trait]
impl SettingsStore for EnvSettingsStore {
    async fn get_option(&self, key: &str) -> Result<Option<String>> {
        Ok(non_blank(std::env::var(Self::env_var_name(key)).ok()))
    }
}

/// In-memory option store
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    options: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_option(key, value);
        self
    }

    pub fn set_option(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut options = self
            .options
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        options.insert(key.into(), value.into());
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_option(&self, key: &str) -> Result<Option<String>> {
        let options = self
            .options
            .lock()
            .map_err(|_| anyhow::anyhow!("settings store lock poisoned"))?;
        Ok(non_blank(options.get(key).cloned()))
    }
}

/// A single attachment record held by `InMemoryMediaStore`
#[derive(Debug, Clone, Default)]
pub struct StoredAttachment {
    pub mime_type: Option<String>,
    pub file_path: Option<PathBuf>,
    pub title: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// In-memory media store, used by the CLI and by tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryMediaStore {
    attachments: Arc<Mutex<HashMap<AttachmentId, StoredAttachment>>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<AttachmentId>, attachment: StoredAttachment) {
        let mut attachments = self
            .attachments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        attachments.insert(id.into(), attachment);
    }

    /// Snapshot of an attachment record
    pub fn get(&self, id: &AttachmentId) -> Option<StoredAttachment> {
        self.attachments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<AttachmentId, StoredAttachment>>> {
        self.attachments
            .lock()
            .map_err(|_| anyhow::anyhow!("media store lock poisoned"))
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn mime_type(&self, id: &AttachmentId) -> Result<Option<String>> {
        Ok(self.lock()?.get(id).and_then(|a| a.mime_type.clone()))
    }

    async fn attached_file(&self, id: &AttachmentId) -> Result<Option<PathBuf>> {
        Ok(self.lock()?.get(id).and_then(|a| a.file_path.clone()))
    }

    async fn title(&self, id: &AttachmentId) -> Result<Option<String>> {
        Ok(non_blank(self.lock()?.get(id).and_then(|a| a.title.clone())))
    }

    async fn get_metadata(&self, id: &AttachmentId, key: &str) -> Result<Option<String>> {
        Ok(self
            .lock()?
            .get(id)
            .and_then(|a| a.metadata.get(key).cloned()))
    }

    async fn update_metadata(&self, id: &AttachmentId, key: &str, value: &str) -> Result<()> {
        let mut attachments = self.lock()?;
        let attachment = attachments
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("Attachment {} not found", id))?;
        attachment
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
