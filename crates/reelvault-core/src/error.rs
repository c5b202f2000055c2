//! Error types module
//!
//! All errors surfaced to callers are unified under the `AppError` enum. Each
//! variant self-describes how it should be presented (status code, stable error
//! code, whether its details may be shown) through the `ErrorMetadata` trait, so
//! the transport layer never has to echo raw internal error text.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for client-side faults such as broken upload streams
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_OWNER_ID")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Owner identifier is required")]
    MissingOwnerId,

    #[error("Invalid owner identifier: {0}")]
    InvalidOwnerId(String),

    #[error("Failed to read upload stream: {0}")]
    StreamRead(String),

    #[error("Storage existence check failed: {0}")]
    StorageExistsCheck(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Upload timed out after {0} seconds")]
    UploadTimeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::MissingFile => (
            400,
            "MISSING_FILE",
            false,
            Some("Send the video in a multipart field named 'file'"),
            false,
            LogLevel::Debug,
        ),
        AppError::MissingOwnerId => (
            400,
            "MISSING_OWNER_ID",
            false,
            Some("Send the owner identifier in the 'cedula' field"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidOwnerId(_) => (
            400,
            "INVALID_OWNER_ID",
            false,
            Some("Use only letters, digits, '-', '_' and '.' in the owner identifier"),
            false,
            LogLevel::Debug,
        ),
        AppError::StreamRead(_) => (
            400,
            "STREAM_READ_ERROR",
            true,
            Some("Check the connection and retry the upload"),
            true,
            LogLevel::Warn,
        ),
        AppError::StorageExistsCheck(_) => (
            502,
            "STORAGE_EXISTS_CHECK_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::StorageWrite(_) => (
            502,
            "STORAGE_WRITE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::MethodNotAllowed(_) => (
            405,
            "METHOD_NOT_ALLOWED",
            false,
            Some("Use POST with multipart/form-data"),
            false,
            LogLevel::Debug,
        ),
        AppError::UploadTimeout(_) => (
            504,
            "UPLOAD_TIMEOUT",
            true,
            Some("Retry the upload, or upload a smaller file"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::MissingFile => "MissingFile",
            AppError::MissingOwnerId => "MissingOwnerId",
            AppError::InvalidOwnerId(_) => "InvalidOwnerId",
            AppError::StreamRead(_) => "StreamRead",
            AppError::StorageExistsCheck(_) => "StorageExistsCheck",
            AppError::StorageWrite(_) => "StorageWrite",
            AppError::Storage(_) => "Storage",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::MethodNotAllowed(_) => "MethodNotAllowed",
            AppError::UploadTimeout(_) => "UploadTimeout",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MissingFile => "No file uploaded".to_string(),
            AppError::MissingOwnerId => "Owner identifier (cedula) is required".to_string(),
            AppError::InvalidOwnerId(ref msg) => format!("Invalid owner identifier: {}", msg),
            AppError::StreamRead(_) => "Failed to read the uploaded file".to_string(),
            AppError::StorageExistsCheck(_) => "Failed to access storage".to_string(),
            AppError::StorageWrite(_) => "Failed to store the uploaded file".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::MethodNotAllowed(ref msg) => msg.clone(),
            AppError::UploadTimeout(secs) => format!("Upload timed out after {} seconds", secs),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_invalid_owner_id() {
        let err = AppError::InvalidOwnerId("contains '..'".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_OWNER_ID");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains(".."));
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_storage_write_hides_details() {
        let err = AppError::StorageWrite("403 Forbidden: service account lacks storage.objects.create".to_string());
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.error_code(), "STORAGE_WRITE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Failed to store the uploaded file");
        assert!(!err.client_message().contains("service account"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_stream_read() {
        let err = AppError::StreamRead("connection reset by peer".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "STREAM_READ_ERROR");
        assert_eq!(err.client_message(), "Failed to read the uploaded file");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_missing_fields() {
        assert_eq!(AppError::MissingFile.error_code(), "MISSING_FILE");
        assert_eq!(AppError::MissingFile.client_message(), "No file uploaded");
        assert_eq!(AppError::MissingOwnerId.error_code(), "MISSING_OWNER_ID");
        assert_eq!(AppError::MissingOwnerId.http_status_code(), 400);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::from(anyhow::anyhow!("disk full").context("spool write failed"));
        let details = err.detailed_message();
        assert!(details.contains("Internal error with source"));
        assert!(details.contains("Caused by"));
        assert_eq!(err.client_message(), "Internal server error");
    }
}
