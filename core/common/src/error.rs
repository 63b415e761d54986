//! Common error types for cloudfile.

use thiserror::Error;

/// Top-level error type for cloud-file provider operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A handshake step failed or a token response was malformed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Fetching or parsing the account profile failed.
    #[error("Profile error: {0}")]
    Profile(String),

    /// Upload transfer failed (transport, HTTP status or response body).
    #[error("Upload error: {0}")]
    Upload(String),

    /// Upload was canceled by the caller.
    #[error("Upload canceled")]
    UploadCanceled,

    /// File is larger than the space left on the account.
    #[error("Upload would exceed quota: {size} bytes requested, {remaining} bytes remaining")]
    UploadWouldExceedQuota { size: u64, remaining: u64 },

    /// File is larger than the provider accepts for a single upload.
    #[error("Upload exceeds file limit: {size} bytes, limit is {limit} bytes")]
    UploadExceedsFileLimit { size: u64, limit: u64 },

    /// Share URL resolution failed.
    #[error("Share error: {0}")]
    Share(String),

    /// Delete request failed or targeted an unknown file.
    #[error("Delete error: {0}")]
    Delete(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether the error stems from an explicit cancellation rather than a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::UploadCanceled)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
