// Upload sync hook: mirrors new video attachments into a Bunny Stream library

use async_trait::async_trait;
use reqwest::Client;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use bunbun_core::models::attachment::is_video_mime;
use bunbun_core::{
    AttachmentId, Credentials, MediaStore, SettingsStore, SkipReason, StreamConfig, SyncError,
    SyncOutcome, SyncResult, SyncResultExt, UploadTarget, API_KEY_KEY, LIBRARY_ID_KEY,
    VIDEO_ID_META_KEY,
};

use crate::bunny_stream::{build_http_client, BunnyStreamClient};
use crate::plugin::AttachmentHook;

/// Drives create → upload → verify → persist for each new video attachment.
///
/// Credentials are read from the settings store on every event, so changes
/// made by an administrator take effect on the next upload.
pub struct UploadSyncHandler {
    settings: Arc<dyn SettingsStore>,
    media_store: Arc<dyn MediaStore>,
    config: StreamConfig,
    http_client: Client,
    cancel: CancellationToken,
}

impl Debug for UploadSyncHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadSyncHandler")
            .field("api_base_url", &self.config.api_base_url)
            .finish()
    }
}

impl UploadSyncHandler {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        media_store: Arc<dyn MediaStore>,
        config: StreamConfig,
    ) -> Result<Self, SyncError> {
        let http_client = build_http_client(&config)?;

        Ok(Self {
            settings,
            media_store,
            config,
            http_client,
            cancel: CancellationToken::new(),
        })
    }

    /// Cancelling the token aborts an in-flight upload
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Read credentials fresh from the host settings.
    pub async fn read_credentials(&self) -> Result<Credentials, SyncError> {
        let api_key = self
            .settings
            .get_option(API_KEY_KEY)
            .await
            .store_context("Failed to read API key setting")?;
        let library_id = self
            .settings
            .get_option(LIBRARY_ID_KEY)
            .await
            .store_context("Failed to read library ID setting")?;

        Credentials::new(api_key.unwrap_or_default(), library_id.unwrap_or_default())
    }

    /// Handle a new attachment. Never fails towards the caller: every error is
    /// logged here, once, and reported in the outcome.
    pub async fn on_attachment_created(&self, attachment_id: &AttachmentId) -> SyncOutcome {
        match self.sync_attachment(attachment_id).await {
            Ok(outcome) => outcome,
            Err(SyncError::Configuration(message)) => {
                tracing::error!(
                    attachment_id = %attachment_id,
                    error = %message,
                    "Skipping video sync: plugin settings incomplete"
                );
                SyncOutcome::Skipped(SkipReason::MissingCredentials)
            }
            Err(err) => {
                tracing::error!(
                    attachment_id = %attachment_id,
                    error_code = err.error_code(),
                    status = ?err.status_code(),
                    error = %err,
                    "Video sync failed"
                );
                SyncOutcome::Failed(err)
            }
        }
    }

    /// Run the sync and propagate failures.
    pub async fn sync_attachment(
        &self,
        attachment_id: &AttachmentId,
    ) -> Result<SyncOutcome, SyncError> {
        let credentials = self.read_credentials().await?;

        let mime_type = self
            .media_store
            .mime_type(attachment_id)
            .await
            .store_context("Failed to read attachment MIME type")?
            .unwrap_or_default();
        if !is_video_mime(&mime_type) {
            tracing::debug!(
                attachment_id = %attachment_id,
                mime_type = %mime_type,
                "Attachment is not a video, nothing to sync"
            );
            return Ok(SyncOutcome::Skipped(SkipReason::NotVideo));
        }

        // createVideo is not idempotent; never create a second record.
        if let Some(existing) = self
            .media_store
            .get_metadata(attachment_id, VIDEO_ID_META_KEY)
            .await
            .store_context("Failed to read attachment metadata")?
            .filter(|id| !id.trim().is_empty())
        {
            tracing::info!(
                attachment_id = %attachment_id,
                video_id = %existing,
                "Attachment already synced"
            );
            return Ok(SyncOutcome::Skipped(SkipReason::AlreadySynced));
        }

        let target = self.upload_target(attachment_id, mime_type).await?;
        let title = self.video_title(attachment_id).await?;

        tracing::info!(
            attachment_id = %attachment_id,
            library_id = %credentials.library_id(),
            mime_type = %target.mime_type,
            "Syncing video attachment to Bunny Stream"
        );

        let client =
            BunnyStreamClient::with_http_client(self.http_client.clone(), credentials, &self.config);

        let video_id = client.create_video(&title).await?;

        client
            .upload_video_with_cancel(&video_id, &target.local_file_path, &self.cancel)
            .await
            .inspect_err(|_| {
                tracing::warn!(
                    attachment_id = %attachment_id,
                    video_id = %video_id,
                    "Upload failed; remote video record has no content"
                );
            })?;

        // Verification only. A failed fetch does not undo a successful upload.
        let verified = match client.get_video(&video_id).await {
            Ok(record) => {
                let failed = record.status.is_some_and(|s| s.is_failed());
                tracing::info!(
                    video_id = %video_id,
                    status = ?record.status,
                    "Fetched remote video record"
                );
                !failed
            }
            Err(err) => {
                tracing::warn!(
                    video_id = %video_id,
                    error = %err,
                    "Could not verify uploaded video"
                );
                false
            }
        };

        self.media_store
            .update_metadata(attachment_id, VIDEO_ID_META_KEY, &video_id)
            .await
            .store_context("Failed to persist video id on attachment")?;

        tracing::info!(
            attachment_id = %attachment_id,
            video_id = %video_id,
            verified,
            "Video attachment synced"
        );

        Ok(SyncOutcome::Synced(SyncResult { video_id, verified }))
    }

    /// Resolve and pre-check the local file, before anything is created remotely.
    async fn upload_target(
        &self,
        attachment_id: &AttachmentId,
        mime_type: String,
    ) -> Result<UploadTarget, SyncError> {
        let local_file_path = self
            .media_store
            .attached_file(attachment_id)
            .await
            .store_context("Failed to read attachment file path")?
            .ok_or_else(|| {
                SyncError::Store(format!("Attachment {} has no attached file", attachment_id))
            })?;

        let metadata = tokio::fs::metadata(&local_file_path)
            .await
            .map_err(|e| SyncError::io(&local_file_path, e))?;
        if !metadata.is_file() {
            return Err(SyncError::io(
                &local_file_path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        Ok(UploadTarget {
            local_file_path,
            mime_type,
        })
    }

    /// The attachment's own title, else the configured default
    async fn video_title(&self, attachment_id: &AttachmentId) -> Result<String, SyncError> {
        let title = self
            .media_store
            .title(attachment_id)
            .await
            .store_context("Failed to read attachment title")?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(title.unwrap_or_else(|| self.config.default_title.clone()))
    }
}

#[async_trait]
impl AttachmentHook for UploadSyncHandler {
    fn name(&self) -> &str {
        "bunny_stream"
    }

    async fn on_attachment_created(&self, attachment_id: &AttachmentId) -> SyncOutcome {
        UploadSyncHandler::on_attachment_created(self, attachment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bunbun_core::{InMemoryMediaStore, MemorySettingsStore, StoredAttachment};
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;

    const GUID: &str = "0b9c3c62-62b4-4d5c-a1a4-2b7a4e0e9c11";

    fn settings() -> MemorySettingsStore {
        MemorySettingsStore::new()
            .with_option(API_KEY_KEY, "test-access-key")
            .with_option(LIBRARY_ID_KEY, "4711")
    }

    fn video_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        file.write_all(b"0123456789").unwrap();
        file.flush().unwrap();
        file
    }

    fn store_with(id: u64, mime: &str, path: Option<PathBuf>, title: Option<&str>) -> InMemoryMediaStore {
        let store = InMemoryMediaStore::new();
        store.insert(
            id,
            StoredAttachment {
                mime_type: Some(mime.to_string()),
                file_path: path,
                title: title.map(str::to_string),
                ..Default::default()
            },
        );
        store
    }

    fn handler(
        server_url: &str,
        settings: MemorySettingsStore,
        store: InMemoryMediaStore,
    ) -> UploadSyncHandler {
        let config = StreamConfig {
            api_base_url: server_url.to_string(),
            ..Default::default()
        };
        UploadSyncHandler::new(Arc::new(settings), Arc::new(store), config).unwrap()
    }

    #[tokio::test]
    async fn test_attachment_title_preferred_over_default() {
        let file = video_file();
        let store = store_with(5, "video/mp4", Some(file.path().to_path_buf()), Some("Holiday 2024"));

        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/library/4711/videos")
            .match_body(Matcher::Json(json!({ "title": "Holiday 2024" })))
            .with_status(200)
            .with_body(json!({ "guid": GUID }).to_string())
            .expect(1)
            .create_async()
            .await;
        server
            .mock("PUT", format!("/library/4711/videos/{}", GUID).as_str())
            .with_status(200)
            .with_body(json!({ "success": true }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", format!("/library/4711/videos/{}", GUID).as_str())
            .with_status(200)
            .with_body(json!({ "guid": GUID, "status": 1 }).to_string())
            .create_async()
            .await;

        let outcome = handler(&server.url(), settings(), store.clone())
            .on_attachment_created(&AttachmentId::from(5u64))
            .await;

        assert_eq!(outcome.video_id(), Some(GUID));
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_already_synced_attachment_is_skipped() {
        let file = video_file();
        let store = store_with(6, "video/mp4", Some(file.path().to_path_buf()), None);
        store
            .update_metadata(&AttachmentId::from(6u64), VIDEO_ID_META_KEY, GUID)
            .await
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let outcome = handler(&server.url(), settings(), store)
            .on_attachment_created(&AttachmentId::from(6u64))
            .await;

        assert!(matches!(
            outcome,
            SyncOutcome::Skipped(SkipReason::AlreadySynced)
        ));
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_blank_stored_video_id_does_not_block_sync() {
        let file = video_file();
        let store = store_with(7, "video/mp4", Some(file.path().to_path_buf()), None);
        store
            .update_metadata(&AttachmentId::from(7u64), VIDEO_ID_META_KEY, "  ")
            .await
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/library/4711/videos")
            .with_status(200)
            .with_body(json!({ "guid": GUID }).to_string())
            .expect(1)
            .create_async()
            .await;
        server
            .mock("PUT", format!("/library/4711/videos/{}", GUID).as_str())
            .with_status(200)
            .with_body(json!({ "success": true }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", format!("/library/4711/videos/{}", GUID).as_str())
            .with_status(200)
            .with_body(json!({ "guid": GUID, "status": 4 }).to_string())
            .create_async()
            .await;

        let outcome = handler(&server.url(), settings(), store.clone())
            .on_attachment_created(&AttachmentId::from(7u64))
            .await;

        assert_eq!(outcome.video_id(), Some(GUID));
        create.assert_async().await;
        let stored = store.get(&AttachmentId::from(7u64)).unwrap();
        assert_eq!(
            stored.metadata.get(VIDEO_ID_META_KEY).map(String::as_str),
            Some(GUID)
        );
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_create() {
        let store = store_with(
            8,
            "video/mp4",
            Some(PathBuf::from("/definitely/not/here/clip.mp4")),
            None,
        );

        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let outcome = handler(&server.url(), settings(), store)
            .on_attachment_created(&AttachmentId::from(8u64))
            .await;

        assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Io { .. })));
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_attached_file_is_store_error() {
        let store = store_with(9, "video/mp4", None, None);
        let server = mockito::Server::new_async().await;

        let outcome = handler(&server.url(), settings(), store)
            .on_attachment_created(&AttachmentId::from(9u64))
            .await;

        assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Store(_))));
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_metadata_untouched() {
        let file = video_file();
        let store = store_with(10, "video/mp4", Some(file.path().to_path_buf()), None);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/library/4711/videos")
            .with_status(200)
            .with_body(json!({ "guid": GUID }).to_string())
            .create_async()
            .await;
        let upload = server
            .mock("PUT", format!("/library/4711/videos/{}", GUID).as_str())
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let get = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let outcome = handler(&server.url(), settings(), store.clone())
            .on_attachment_created(&AttachmentId::from(10u64))
            .await;

        match outcome {
            SyncOutcome::Failed(err) => assert_eq!(err.status_code(), Some(500)),
            other => panic!("expected failure, got {:?}", other),
        }
        let stored = store.get(&AttachmentId::from(10u64)).unwrap();
        assert!(!stored.metadata.contains_key(VIDEO_ID_META_KEY));
        upload.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_verification_still_persists_video_id() {
        let file = video_file();
        let store = store_with(11, "video/quicktime", Some(file.path().to_path_buf()), None);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/library/4711/videos")
            .with_status(200)
            .with_body(json!({ "guid": GUID }).to_string())
            .create_async()
            .await;
        server
            .mock("PUT", format!("/library/4711/videos/{}", GUID).as_str())
            .with_status(200)
            .with_body(json!({ "success": true }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", format!("/library/4711/videos/{}", GUID).as_str())
            .with_status(404)
            .create_async()
            .await;

        let outcome = handler(&server.url(), settings(), store.clone())
            .on_attachment_created(&AttachmentId::from(11u64))
            .await;

        match outcome {
            SyncOutcome::Synced(result) => {
                assert_eq!(result.video_id, GUID);
                assert!(!result.verified);
            }
            other => panic!("expected synced, got {:?}", other),
        }
        let stored = store.get(&AttachmentId::from(11u64)).unwrap();
        assert_eq!(stored.metadata.get(VIDEO_ID_META_KEY).map(String::as_str), Some(GUID));
    }

    #[tokio::test]
    async fn test_cancelled_handler_aborts_upload() {
        let file = video_file();
        let store = store_with(12, "video/mp4", Some(file.path().to_path_buf()), None);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/library/4711/videos")
            .with_status(200)
            .with_body(json!({ "guid": GUID }).to_string())
            .create_async()
            .await;

        let token = CancellationToken::new();
        token.cancel();
        let outcome = handler(&server.url(), settings(), store)
            .with_cancellation(token)
            .on_attachment_created(&AttachmentId::from(12u64))
            .await;

        assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Cancelled(_))));
    }

    #[test]
    fn test_hook_name() {
        let handler = handler(
            "https://video.bunnycdn.com",
            settings(),
            InMemoryMediaStore::new(),
        );
        assert_eq!(AttachmentHook::name(&handler), "bunny_stream");
    }
}
