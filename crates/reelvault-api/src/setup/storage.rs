use anyhow::{Context, Result};
use reelvault_core::Config;
use reelvault_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the configured storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .with_context(|| format!("Failed to initialize {} storage", config.storage_backend))?;

    tracing::info!(
        backend = %storage.backend_type(),
        namespace = %config.key_namespace,
        writer_max_concurrency = config.writer_max_concurrency,
        "Storage ready"
    );

    Ok(storage)
}
