//! Application state shared by all handlers.

use reelvault_core::Config;
use reelvault_ingest::IngestionPipeline;
use reelvault_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub pipeline: IngestionPipeline,
    /// Decided once from `Config`; hides error details from clients.
    pub is_production: bool,
}

impl AppState {
    /// Build the state around an already-initialized storage backend.
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        let pipeline = IngestionPipeline::from_config(storage.clone(), &config);
        AppState {
            is_production: config.is_production(),
            config,
            storage,
            pipeline,
        }
    }
}
