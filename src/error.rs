//! Typed errors for the fetch layer and the job store.

use thiserror::Error;

/// Errors that can occur while fetching a search results page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Host is not on the allow-list; nothing was sent
    #[error("domain not allowed: {url}")]
    Disallowed { url: String },

    /// URL could not be parsed or has no host
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Connection, TLS or body read failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Server answered with a non-2xx status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Request exceeded the configured timeout
    #[error("timeout fetching {url}")]
    Timeout { url: String },
}

impl FetchError {
    /// HTTP status code, when the server sent one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by a [`crate::storage::JobStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup matched no row. Expected during dedup, not a failure.
    #[error("record not found")]
    NotFound,

    /// Insert rejected by the `(user_id, external_id)` unique constraint
    #[error("duplicate record")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
