//! Playback URL construction
//!
//! Playback URLs have the form `https://{host}/play/{library_id}/{video_id}`.
//! Two hosts are available: the fixed player host and the optional CDN
//! hostname from the host settings. Which one is used is the caller's choice.
//! Unauthenticated playback requires Direct Play to be enabled on the library.

use serde::{Deserialize, Serialize};

/// Which host a playback URL is built against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackHost {
    #[default]
    Player,
    Cdn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackUrlBuilder {
    player_host: String,
    cdn_hostname: Option<String>,
}

impl PlaybackUrlBuilder {
    pub fn new(player_host: impl Into<String>) -> Self {
        Self {
            player_host: normalize_host(&player_host.into()),
            cdn_hostname: None,
        }
    }

    /// Blank hostnames are treated as unset
    pub fn with_cdn_hostname(mut self, cdn_hostname: Option<String>) -> Self {
        self.cdn_hostname = cdn_hostname
            .map(|h| normalize_host(&h))
            .filter(|h| !h.is_empty());
        self
    }

    pub fn cdn_hostname(&self) -> Option<&str> {
        self.cdn_hostname.as_deref()
    }

    /// Build a playback URL. Returns `None` when the CDN host is requested
    /// but not configured, or when either id is blank.
    pub fn build(&self, host: PlaybackHost, library_id: &str, video_id: &str) -> Option<String> {
        let library_id = library_id.trim();
        let video_id = video_id.trim();
        if library_id.is_empty() || video_id.is_empty() {
            return None;
        }

        let host = match host {
            PlaybackHost::Player => self.player_host.as_str(),
            PlaybackHost::Cdn => self.cdn_hostname.as_deref()?,
        };

        Some(format!(
            "https://{}/play/{}/{}",
            host,
            urlencoding::encode(library_id),
            urlencoding::encode(video_id)
        ))
    }
}

/// Accepts "host", "https://host/" or "http://host" and keeps only the host part.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    host.trim_end_matches('/').to_string()
}
