//! Front-end video field filter
//!
//! Rewrites the source of a rendered video field to the provider playback
//! URL once the attachment carries a provider video id.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use bunbun_core::{
    AttachmentId, MediaStore, PlaybackHost, PlaybackUrlBuilder, SettingsStore, SyncError,
    SyncResultExt, CDN_HOSTNAME_KEY, LIBRARY_ID_KEY, VIDEO_ID_META_KEY,
};

pub struct PlaybackFieldFilter {
    settings: Arc<dyn SettingsStore>,
    media_store: Arc<dyn MediaStore>,
    player_host: String,
    host: PlaybackHost,
}

impl Debug for PlaybackFieldFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PlaybackFieldFilter")
            .field("player_host", &self.player_host)
            .field("host", &self.host)
            .finish()
    }
}

impl PlaybackFieldFilter {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        media_store: Arc<dyn MediaStore>,
        player_host: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            media_store,
            player_host: player_host.into(),
            host: PlaybackHost::Player,
        }
    }

    /// Choose between the player host and the configured CDN hostname
    pub fn with_host(mut self, host: PlaybackHost) -> Self {
        self.host = host;
        self
    }

    /// Playback URL for the attachment, or `None` when it has not been synced
    /// or the chosen host is not configured.
    pub async fn playback_url(&self, attachment_id: &AttachmentId) -> Result<Option<String>, SyncError> {
        let Some(video_id) = self
            .media_store
            .get_metadata(attachment_id, VIDEO_ID_META_KEY)
            .await
            .store_context("Failed to read attachment metadata")?
        else {
            return Ok(None);
        };

        let Some(library_id) = self
            .settings
            .get_option(LIBRARY_ID_KEY)
            .await
            .store_context("Failed to read library ID setting")?
        else {
            return Ok(None);
        };

        let cdn_hostname = self
            .settings
            .get_option(CDN_HOSTNAME_KEY)
            .await
            .store_context("Failed to read CDN hostname setting")?;

        let builder = PlaybackUrlBuilder::new(self.player_host.as_str()).with_cdn_hostname(cdn_hostname);
        Ok(builder.build(self.host, &library_id, &video_id))
    }

    /// Filter a rendered field value. Falls back to `original` on any miss or error.
    pub async fn filter_video_src(&self, attachment_id: &AttachmentId, original: &str) -> String {
        match self.playback_url(attachment_id).await {
            Ok(Some(url)) => url,
            Ok(None) => original.to_string(),
            Err(err) => {
                tracing::warn!(
                    attachment_id = %attachment_id,
                    error = %err,
                    "Could not build playback URL, keeping original source"
                );
                original.to_string()
            }
        }
    }
}
