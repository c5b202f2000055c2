//! Reelvault Storage Library
//!
//! This crate provides the object-store collaborator used by the ingestion
//! pipeline: the `Storage` and `WriteSink` traits, an adapter over the
//! `object_store` crate (Google Cloud Storage, S3-compatible, in-memory) and a
//! local filesystem adapter.
//!
//! # Visibility guarantee
//!
//! Every backend makes an object visible under its key only once
//! `WriteSink::close` succeeds. An aborted or dropped sink never leaves
//! anything that passes a later `Storage::exists` check for that key.
//!
//! Keys must not contain `..` or a leading `/`.

pub mod cloud;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use cloud::ObjectStoreStorage;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reelvault_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult, WriteSink};
