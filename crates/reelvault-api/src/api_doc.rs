//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use reelvault_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelvault API",
        version = "0.1.0",
        description = "Content-addressed video ingestion. Uploads are hashed with SHA-256 while streaming, stored under videos/{owner}/{sha256}.mp4, and written only when no identical object exists for the owner. The legacy route POST /api/uploadVideo accepts the same form as POST /api/v0/videos."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::health::health_check,
    ),
    components(schemas(
        models::UploadResult,
        models::UploadStatus,
        error::ErrorResponse,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "videos", description = "Video ingestion"),
        (name = "health", description = "Liveness and storage reachability")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_upload_route() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/api/v0/videos"));
        assert!(spec.paths.paths.contains_key("/health"));
    }
}
