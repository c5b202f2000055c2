use reelvault_core::AppError;
use reelvault_storage::StorageError;
use thiserror::Error;

/// Failures of the ingestion pipeline.
///
/// Validation variants (`MissingFile`, `MissingOwnerId`, `InvalidOwnerId`) are
/// always raised before the object store is touched.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no file stream supplied")]
    MissingFile,

    #[error("owner identifier is missing or empty")]
    MissingOwnerId,

    #[error("invalid owner identifier: {0}")]
    InvalidOwnerId(String),

    #[error("upload stream failed after {bytes_read} bytes: {message}")]
    StreamRead { bytes_read: u64, message: String },

    #[error("payload exceeds the {max_bytes} byte limit")]
    PayloadTooLarge { max_bytes: u64 },

    #[error("existence check failed for {key}")]
    StorageExistsCheck {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("write failed for {key}")]
    StorageWrite {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("spool I/O failed: {0}")]
    Spool(#[from] std::io::Error),
}

impl IngestError {
    /// Stable, machine-readable kind used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::MissingFile => "missing_file",
            IngestError::MissingOwnerId => "missing_owner_id",
            IngestError::InvalidOwnerId(_) => "invalid_owner_id",
            IngestError::StreamRead { .. } => "stream_read",
            IngestError::PayloadTooLarge { .. } => "payload_too_large",
            IngestError::StorageExistsCheck { .. } => "storage_exists_check",
            IngestError::StorageWrite { .. } => "storage_write",
            IngestError::Spool(_) => "spool",
        }
    }

    /// Whether the failure happened before any object-store call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IngestError::MissingFile | IngestError::MissingOwnerId | IngestError::InvalidOwnerId(_)
        )
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingFile => AppError::MissingFile,
            IngestError::MissingOwnerId => AppError::MissingOwnerId,
            IngestError::InvalidOwnerId(reason) => AppError::InvalidOwnerId(reason),
            IngestError::StreamRead { bytes_read, message } => {
                AppError::StreamRead(format!("after {} bytes: {}", bytes_read, message))
            }
            IngestError::PayloadTooLarge { max_bytes } => AppError::PayloadTooLarge(format!(
                "Video exceeds the maximum size of {} MB",
                max_bytes / (1024 * 1024)
            )),
            IngestError::StorageExistsCheck { key, source } => {
                AppError::StorageExistsCheck(format!("{}: {}", key, source))
            }
            IngestError::StorageWrite { key, source } => {
                AppError::StorageWrite(format!("{}: {}", key, source))
            }
            IngestError::Spool(e) => AppError::InternalWithSource {
                message: "Failed to spool upload".to_string(),
                source: e.into(),
            },
        }
    }
}
