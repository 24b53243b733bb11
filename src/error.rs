//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, MirrorError>;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("author key {key:?} not found in mirror")]
    AuthorNotFound { key: String },

    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The persisted bundle cannot be read by this build; callers rebuild from source.
    #[error("incompatible artifact at {path}: {reason}")]
    IncompatibleArtifact { path: PathBuf, reason: String },

    #[error("artifact not found at {path}")]
    ArtifactMissing { path: PathBuf },

    #[error("http request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("release retrieval failed: {reason}")]
    Release { reason: String },

    #[error("frame size must be at least 1")]
    InvalidFrameSize,

    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },

    #[error("name index is not available; load with search restoration or rebuild")]
    SearchDisabled,

    #[error("remote sources require the `remote` feature")]
    RemoteDisabled,

    #[error("frame {frame} is corrupt: {reason}")]
    CorruptFrame { frame: usize, reason: String },

    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl MirrorError {
    /// Lookups against keys or ids the mirror does not hold.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AuthorNotFound { .. }
                | Self::IndexOutOfRange { .. }
                | Self::ArtifactMissing { .. }
        )
    }

    /// Persisted state that must be rebuilt rather than read.
    #[must_use]
    pub fn is_incompatible(&self) -> bool {
        matches!(self, Self::IncompatibleArtifact { .. })
    }

    pub(crate) fn http(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Http {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for MirrorError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map_or_else(|| "<unknown>".to_string(), ToString::to_string);
        Self::Http {
            url,
            reason: err.to_string(),
        }
    }
}
