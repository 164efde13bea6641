// Bunny Stream API client for video library uploads

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use bunbun_core::{Credentials, StreamConfig, SyncError, VideoRecord};

use crate::retry::{with_retry, RetryPolicy};

const ACCESS_KEY_HEADER: &str = "AccessKey";
const MAX_ERROR_BODY_LEN: usize = 512;

/// Build the shared HTTP client.
///
/// No client-wide timeout: the JSON calls and the upload set their own
/// per-request timeouts, and uploads of large files can take hours.
pub fn build_http_client(config: &StreamConfig) -> Result<Client, SyncError> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| {
            SyncError::Internal(format!("Failed to create HTTP client for Bunny Stream: {}", e))
        })
}

/// Client for one Stream video library.
///
/// Holds the credentials it was constructed with; every call is independent.
pub struct BunnyStreamClient {
    http_client: Client,
    base_url: String,
    credentials: Credentials,
    api_timeout: Duration,
    upload_timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl Debug for BunnyStreamClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BunnyStreamClient")
            .field("base_url", &self.base_url)
            .field("library_id", &self.credentials.library_id())
            .finish()
    }
}

impl BunnyStreamClient {
    pub fn new(credentials: Credentials, config: &StreamConfig) -> Result<Self, SyncError> {
        Ok(Self::with_http_client(
            build_http_client(config)?,
            credentials,
            config,
        ))
    }

    /// Reuse an existing connection pool
    pub fn with_http_client(
        http_client: Client,
        credentials: Credentials,
        config: &StreamConfig,
    ) -> Self {
        Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            credentials,
            api_timeout: config.api_timeout,
            upload_timeout: config.upload_timeout,
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn videos_url(&self) -> String {
        format!(
            "{}/library/{}/videos",
            self.base_url,
            urlencoding::encode(self.credentials.library_id())
        )
    }

    fn video_url(&self, video_id: &str) -> String {
        format!("{}/{}", self.videos_url(), urlencoding::encode(video_id))
    }

    fn request_headers(&self, with_content_type: bool) -> Result<HeaderMap, SyncError> {
        let mut headers = HeaderMap::new();
        let access_key = HeaderValue::from_str(self.credentials.access_key()).map_err(|_| {
            SyncError::Configuration("API key contains characters not allowed in a header".into())
        })?;
        headers.insert(ACCESS_KEY_HEADER, access_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if with_content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// Create an empty video record and return its GUID.
    ///
    /// Not idempotent: every call creates a new remote record, so it is never retried.
    pub async fn create_video(&self, title: &str) -> Result<String, SyncError> {
        if title.trim().is_empty() {
            return Err(SyncError::InvalidInput(
                "Video title must not be empty".to_string(),
            ));
        }

        let response = self
            .http_client
            .post(self.videos_url())
            .headers(self.request_headers(true)?)
            .timeout(self.api_timeout)
            .json(&CreateVideoRequest { title })
            .send()
            .await
            .map_err(network_error)?;

        let response = check_response(response).await?;
        let created: CreateVideoResponse = parse_json(response).await?;

        if created.guid.trim().is_empty() {
            return Err(SyncError::InvalidResponse(
                "Create video response did not contain a guid".to_string(),
            ));
        }

        tracing::info!(
            library_id = %self.credentials.library_id(),
            video_id = %created.guid,
            "Created Bunny Stream video record"
        );

        Ok(created.guid)
    }

    /// Upload the file as the video's binary payload.
    pub async fn upload_video(
        &self,
        video_id: &str,
        file_path: &Path,
    ) -> Result<VideoRecord, SyncError> {
        self.upload_video_with_cancel(video_id, file_path, &CancellationToken::new())
            .await
    }

    /// Upload the file, aborting when `cancel` fires.
    ///
    /// The file is opened before any request is issued, so a missing or
    /// unreadable file fails with `SyncError::Io` without touching the network.
    pub async fn upload_video_with_cancel(
        &self,
        video_id: &str,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<VideoRecord, SyncError> {
        require_video_id(video_id)?;

        with_retry(&self.retry, "upload_video", move || {
            self.upload_once(video_id, file_path, cancel)
        })
        .await
    }

    async fn upload_once(
        &self,
        video_id: &str,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<VideoRecord, SyncError> {
        let file = File::open(file_path)
            .await
            .map_err(|e| SyncError::io(file_path, e))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| SyncError::io(file_path, e))?;
        if !metadata.is_file() {
            return Err(SyncError::io(
                file_path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let file_size = metadata.len();

        tracing::info!(
            video_id = %video_id,
            bytes = file_size,
            "Uploading video payload to Bunny Stream"
        );

        // The file handle lives inside the body stream and is closed when the
        // request future completes or is dropped.
        let mut request = self
            .http_client
            .put(self.video_url(video_id))
            .headers(self.request_headers(false)?)
            .header(CONTENT_LENGTH, file_size)
            .body(Body::wrap_stream(ReaderStream::new(file)));
        if let Some(timeout) = self.upload_timeout {
            request = request.timeout(timeout);
        }

        // Cancellation covers the whole exchange, including the response body.
        let exchange = async {
            let response = request.send().await.map_err(network_error)?;
            let response = check_response(response).await?;
            parse_json::<VideoRecord>(response).await
        };

        let mut record = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(SyncError::Cancelled(format!("Upload of video {} cancelled", video_id)));
            }
            result = exchange => result?,
        };
        // The upload endpoint answers with a status envelope without a guid.
        if record.id.is_empty() {
            record.id = video_id.to_string();
        }

        tracing::info!(video_id = %video_id, bytes = file_size, "Video payload uploaded");

        Ok(record)
    }

    /// Fetch the current remote record.
    ///
    /// Non-2xx responses fail with `SyncError::Provider`, the same policy as
    /// the other two calls.
    pub async fn get_video(&self, video_id: &str) -> Result<VideoRecord, SyncError> {
        require_video_id(video_id)?;

        with_retry(&self.retry, "get_video", move || async move {
            let response = self
                .http_client
                .get(self.video_url(video_id))
                .headers(self.request_headers(false)?)
                .timeout(self.api_timeout)
                .send()
                .await
                .map_err(network_error)?;

            let response = check_response(response).await?;
            parse_json::<VideoRecord>(response).await
        })
        .await
    }
}

fn require_video_id(video_id: &str) -> Result<(), SyncError> {
    if video_id.trim().is_empty() {
        return Err(SyncError::InvalidInput(
            "Video id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn network_error(err: reqwest::Error) -> SyncError {
    let mut message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    SyncError::Network(message)
}

/// Map non-2xx responses to `SyncError::Provider`, reading at most a bounded
/// prefix of the body.
async fn check_response(mut response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = Vec::with_capacity(MAX_ERROR_BODY_LEN);
    while body.len() < MAX_ERROR_BODY_LEN {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(_) => {
                if body.is_empty() {
                    body.extend_from_slice(b"Unknown error");
                }
                break;
            }
        }
    }
    body.truncate(MAX_ERROR_BODY_LEN);

    Err(SyncError::Provider {
        status: status.as_u16(),
        message: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, SyncError> {
    let body = response.bytes().await.map_err(network_error)?;
    Ok(serde_json::from_slice(&body)?)
}

// Bunny Stream API request/response types
#[derive(Debug, Serialize)]
struct CreateVideoRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateVideoResponse {
    #[serde(default)]
    guid: String,
}
