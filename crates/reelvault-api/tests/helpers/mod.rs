//! Test helpers: build AppState and router over an in-memory object store.
//!
//! Run from workspace root: `cargo test -p reelvault-api --test upload_test`.

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use reelvault_api::setup::routes;
use reelvault_api::AppState;
use reelvault_core::{Config, StorageBackend};
use reelvault_storage::{ObjectStoreStorage, Storage, StorageError, StorageResult, WriteSink};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_BUCKET: &str = "test-bucket";

/// Test application: server plus direct access to the backing store.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<dyn Storage>,
    pub _spool_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

/// Build a test app over an in-memory store that renders `gs://` locations.
pub fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    setup_test_app_over(gcs_fake(), customize)
}

/// Build a test app over the given store.
pub fn setup_test_app_over(
    storage: Arc<dyn Storage>,
    customize: impl FnOnce(&mut Config),
) -> TestApp {
    let spool_dir = tempfile::tempdir().expect("Failed to create spool dir");

    let mut config = Config::in_memory(TEST_BUCKET);
    config.spool_dir = Some(spool_dir.path().display().to_string());
    customize(&mut config);

    let state = Arc::new(AppState::new(config.clone(), storage.clone()));
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        storage,
        _spool_dir: spool_dir,
    }
}

pub fn gcs_fake() -> Arc<dyn Storage> {
    Arc::new(ObjectStoreStorage::new(
        Arc::new(object_store::memory::InMemory::new()),
        StorageBackend::Gcs,
        TEST_BUCKET,
    ))
}

/// How a [`FaultyStorage`] misbehaves.
#[derive(Clone, Copy)]
pub enum Fault {
    /// Every call waits forever.
    Stall,
    /// Every call fails with a backend error.
    Fail,
}

/// Store that never answers successfully.
pub struct FaultyStorage {
    fault: Fault,
}

impl FaultyStorage {
    pub fn new(fault: Fault) -> Arc<dyn Storage> {
        Arc::new(FaultyStorage { fault })
    }

    async fn misbehave<T>(&self) -> StorageResult<T> {
        match self.fault {
            Fault::Stall => std::future::pending().await,
            Fault::Fail => Err(StorageError::BackendError(
                "connection refused by storage.googleapis.com".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
        self.misbehave().await
    }

    async fn open_writer(
        &self,
        _storage_key: &str,
        _content_type: &str,
    ) -> StorageResult<Box<dyn WriteSink>> {
        self.misbehave().await
    }

    fn object_uri(&self, storage_key: &str) -> String {
        format!("gs://{}/{}", TEST_BUCKET, storage_key)
    }

    async fn content_length(&self, _storage_key: &str) -> StorageResult<u64> {
        self.misbehave().await
    }

    async fn download(&self, _storage_key: &str) -> StorageResult<Bytes> {
        self.misbehave().await
    }

    async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
        self.misbehave().await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}

/// Multipart form with a video part and the owner in `cedula`.
pub fn video_form(owner: &str, data: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .add_text("cedula", owner.to_string())
        .add_part("file", video_part(data))
}

pub fn video_part(data: &[u8]) -> Part {
    Part::bytes(data.to_vec())
        .file_name("clip.mp4")
        .mime_type("video/mp4")
}
