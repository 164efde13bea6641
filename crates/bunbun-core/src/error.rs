//! Error types module
//!
//! All failures of a single attachment sync are expressed as `SyncError`.
//! A sync failure is always scoped to one attachment: callers log it at the
//! hook boundary and move on to the next event.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Missing or malformed credentials/settings. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Non-2xx response from the provider API.
    #[error("Provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Transport-level failure (connection refused, DNS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Failure reported by a host collaborator (settings or media store).
    #[error("Media store error: {0}")]
    Store(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn store(err: anyhow::Error) -> Self {
        SyncError::Store(format!("{:#}", err))
    }

    /// HTTP status carried by a provider error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SyncError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Only transport failures and 5xx responses may be retried.
    /// 4xx responses are client or auth errors and retrying cannot help.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Provider { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Machine-readable error code (e.g., "PROVIDER_ERROR") for structured logs
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "CONFIGURATION_ERROR",
            SyncError::InvalidInput(_) => "INVALID_INPUT",
            SyncError::Provider { .. } => "PROVIDER_ERROR",
            SyncError::Io { .. } => "IO_ERROR",
            SyncError::Network(_) => "NETWORK_ERROR",
            SyncError::InvalidResponse(_) => "INVALID_RESPONSE",
            SyncError::Store(_) => "STORE_ERROR",
            SyncError::Cancelled(_) => "CANCELLED",
            SyncError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::InvalidResponse(format!("JSON parsing error: {}", err))
    }
}

/// Adds sync-error context to collaborator results.
pub trait SyncResultExt<T> {
    fn store_context(self, context: &'static str) -> Result<T, SyncError>;
}

impl<T> SyncResultExt<T> for anyhow::Result<T> {
    fn store_context(self, context: &'static str) -> Result<T, SyncError> {
        self.map_err(|err| SyncError::store(err.context(context)))
    }
}
