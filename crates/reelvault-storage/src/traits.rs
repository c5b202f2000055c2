//! Storage abstraction traits
//!
//! `Storage` is the object-store capability the ingestion pipeline depends on:
//! existence checks, opening write sinks and rendering object URIs. Backends
//! also expose a few read/delete operations used for verification.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Sequential byte sink over a single object.
///
/// Bytes written are not visible under the key until `close` returns `Ok`.
/// `abort` (or dropping the sink without closing it) discards everything
/// written so far.
#[async_trait]
pub trait WriteSink: Send {
    /// Append a chunk. Awaiting this is the backpressure point for callers.
    async fn write(&mut self, chunk: Bytes) -> StorageResult<()>;

    /// Finalize the object, making it visible. Returns the total bytes written.
    async fn close(self: Box<Self>) -> StorageResult<u64>;

    /// Discard the in-progress object.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}

/// Object-store capability
///
/// All backends (GCS, S3, in-memory, local filesystem) implement this trait so
/// the ingestion pipeline works with any of them, including test fakes.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if an object exists under the key
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Open a write sink for the key. Nothing is visible until the sink is closed.
    async fn open_writer(
        &self,
        storage_key: &str,
        content_type: &str,
    ) -> StorageResult<Box<dyn WriteSink>>;

    /// Location URI of the object under the key (e.g. `gs://bucket/key`)
    fn object_uri(&self, storage_key: &str) -> String;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Download an object by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Delete an object by its storage key. Deleting a missing object is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
