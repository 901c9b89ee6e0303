// ABOUTME: Error types for yasnoop-disk.
// ABOUTME: Defines DiskError covering HTTP transport, API status, and decoding failures.

use thiserror::Error;

/// Errors returned by a remote storage backend.
#[derive(Error, Debug)]
pub enum DiskError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status code the caller did not expect.
    #[error("unexpected status {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The requested resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A file is already stored at the destination path.
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    /// Failure injected by the in-memory backend.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias using DiskError.
pub type Result<T> = std::result::Result<T, DiskError>;
