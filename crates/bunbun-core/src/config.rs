//! Configuration module
//!
//! Process-level settings for talking to the Bunny Stream API. Per-event
//! credentials are not part of this struct: they are read fresh from the
//! host's `SettingsStore` for every attachment under the keys below.

use std::env;
use std::time::Duration;

/// Settings key holding the Stream API access key
pub const API_KEY_KEY: &str = "bun_api_key";
/// Settings key holding the Stream library ID
pub const LIBRARY_ID_KEY: &str = "bun_library_id";
/// Settings key holding the optional pull-zone hostname
pub const CDN_HOSTNAME_KEY: &str = "bun_cdn_hostname";
/// Attachment metadata key the provider video GUID is written under
pub const VIDEO_ID_META_KEY: &str = "bun_video_id";

const API_BASE_URL: &str = "https://video.bunnycdn.com";
const API_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const UPLOAD_TIMEOUT_SECS: u64 = 6 * 60 * 60;
const DEFAULT_TITLE: &str = "Unnamed video";
const PLAYER_HOST: &str = "iframe.mediadelivery.net";
const RETRY_BACKOFF_MS: u64 = 500;

#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Base URL of the Stream API (overridden in tests)
    pub api_base_url: String,
    /// Timeout for the JSON calls (create, get)
    pub api_timeout: Duration,
    pub connect_timeout: Duration,
    /// Timeout for the binary upload. `None` disables it; large files can take hours.
    pub upload_timeout: Option<Duration>,
    /// Title used when the attachment has none
    pub default_title: String,
    /// Host used for player playback URLs
    pub player_host: String,
    /// Retries for idempotent calls only. 0 disables retrying.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(API_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            upload_timeout: Some(Duration::from_secs(UPLOAD_TIMEOUT_SECS)),
            default_title: DEFAULT_TITLE.to_string(),
            player_host: PLAYER_HOST.to_string(),
            max_retries: 0,
            retry_backoff: Duration::from_millis(RETRY_BACKOFF_MS),
        }
    }
}

impl StreamConfig {
    /// Read `BUNBUN_*` variables from the process environment. Loading a
    /// `.env` file is left to the binary, before logging is set up.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();

        let upload_timeout_secs: u64 = env::var("BUNBUN_UPLOAD_TIMEOUT_SECS")
            .unwrap_or_else(|_| UPLOAD_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("BUNBUN_UPLOAD_TIMEOUT_SECS must be a number"))?;

        let config = Self {
            api_base_url: env::var("BUNBUN_API_BASE_URL")
                .unwrap_or(defaults.api_base_url)
                .trim_end_matches('/')
                .to_string(),
            api_timeout: Duration::from_secs(
                env::var("BUNBUN_API_TIMEOUT_SECS")
                    .unwrap_or_else(|_| API_TIMEOUT_SECS.to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("BUNBUN_API_TIMEOUT_SECS must be a number"))?,
            ),
            connect_timeout: Duration::from_secs(
                env::var("BUNBUN_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| CONNECT_TIMEOUT_SECS.to_string())
                    .parse()
                    .map_err(|_| {
                        anyhow::anyhow!("BUNBUN_CONNECT_TIMEOUT_SECS must be a number")
                    })?,
            ),
            upload_timeout: (upload_timeout_secs > 0)
                .then(|| Duration::from_secs(upload_timeout_secs)),
            default_title: env::var("BUNBUN_DEFAULT_TITLE").unwrap_or(defaults.default_title),
            player_host: env::var("BUNBUN_PLAYER_HOST").unwrap_or(defaults.player_host),
            max_retries: env::var("BUNBUN_MAX_RETRIES")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BUNBUN_MAX_RETRIES must be a number"))?,
            retry_backoff: Duration::from_millis(
                env::var("BUNBUN_RETRY_BACKOFF_MS")
                    .unwrap_or_else(|_| RETRY_BACKOFF_MS.to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("BUNBUN_RETRY_BACKOFF_MS must be a number"))?,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("BUNBUN_API_BASE_URL must not be empty"));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "BUNBUN_API_BASE_URL must be an http(s) URL"
            ));
        }

        if self.api_timeout.is_zero() {
            return Err(anyhow::anyhow!("BUNBUN_API_TIMEOUT_SECS must be greater than 0"));
        }

        if self.default_title.trim().is_empty() {
            return Err(anyhow::anyhow!("BUNBUN_DEFAULT_TITLE must not be empty"));
        }

        if self.player_host.trim().is_empty() {
            return Err(anyhow::anyhow!("BUNBUN_PLAYER_HOST must not be empty"));
        }

        Ok(())
    }
}
