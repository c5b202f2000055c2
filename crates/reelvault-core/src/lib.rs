//! Reelvault Core Library
//!
//! This crate provides the configuration, error types and upload result models
//! shared by the storage adapters, the ingestion pipeline and the HTTP service.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{MediaClass, UploadResult, UploadStatus};
pub use storage_types::StorageBackend;
