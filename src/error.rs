//! Error types for bucket operations
//!
//! Every facade operation reports exactly one of the kinds below; failures
//! are surfaced directly with no retry or recovery inside the crate, and
//! there is no generic success/failure boolean to hide behind.

use std::path::PathBuf;

use thiserror::Error;

/// Source error preserved from the AWS SDK or transport layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A key the service refused to remove in a batch delete.
#[derive(Debug, Clone)]
pub struct DeleteFailure {
    pub key: String,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Failures surfaced by [`BucketClient`](crate::BucketClient) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither explicit keys nor both credential files were available.
    #[error("credential files `key` and `private_key` not found under {dir:?}")]
    CredentialsNotFound { dir: PathBuf },

    /// A constructor or operation input failed validation before any
    /// network activity.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The storage service rejected the supplied credentials.
    #[error("the storage service rejected the credentials")]
    Authentication {
        #[source]
        source: BoxError,
    },

    /// The addressed bucket does not exist or is not visible to the caller.
    #[error("bucket `{bucket}` not found")]
    BucketNotFound { bucket: String },

    /// The local file to upload is missing or unreadable.
    #[error("local file {path:?} not found or unreadable")]
    LocalFileNotFound {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Writing a downloaded object to disk failed.
    #[error("failed to write {path:?}")]
    LocalWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote key does not exist in the bucket.
    #[error("object `{key}` not found in bucket `{bucket}`")]
    RemoteObjectNotFound { bucket: String, key: String },

    /// The upload request failed after the local file was opened.
    #[error("upload of `{key}` failed")]
    UploadFailed {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The service reported no plain SHA-256 checksum for the object.
    #[error("no SHA-256 checksum available for `{key}`")]
    HashUnavailable { key: String },

    /// A batch delete removed some keys but the service refused others.
    #[error("{} of {} objects could not be deleted", .failed.len(), .attempted)]
    PartialDeleteFailure {
        attempted: usize,
        failed: Vec<DeleteFailure>,
    },

    /// Any other service or transport failure, surfaced as-is.
    #[error("storage service request failed")]
    Service {
        #[source]
        source: BoxError,
    },
}
