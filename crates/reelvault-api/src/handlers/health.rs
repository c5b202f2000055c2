use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const STORAGE_PROBE_KEY: &str = "health-check-non-existent-key";
const STORAGE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and storage reachable", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let probe = tokio::time::timeout(STORAGE_PROBE_TIMEOUT, state.storage.exists(STORAGE_PROBE_KEY)).await;

    let storage = match probe {
        Ok(Ok(_)) => "healthy",
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Storage health check failed");
            "unhealthy"
        }
        Err(_) => {
            tracing::error!("Storage health check timed out");
            "timeout"
        }
    };

    let (status, label) = if storage == "healthy" {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            storage: storage.to_string(),
        }),
    )
}
