use crate::constants::{FILE_FIELD, OWNER_FIELDS};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reelvault_core::{AppError, UploadResult};
use reelvault_ingest::key::MAX_OWNER_ID_LEN;
use reelvault_ingest::{IngestError, IngestionPipeline, StagedUpload};
use std::sync::Arc;
use std::time::Duration;

#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields: 'file' (video bytes) and 'cedula' or 'owner_id' (owner identifier)"),
    responses(
        (status = 201, description = "Video stored", body = UploadResult),
        (status = 200, description = "Identical video already stored for this owner", body = UploadResult),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse),
        (status = 504, description = "Upload timed out", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let timeout_secs = state.config.upload_timeout_secs;

    // Dropping the ingest future on timeout discards the spool and aborts any open sink
    let result = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        ingest_multipart(&state.pipeline, multipart),
    )
    .await
    .map_err(|_| AppError::UploadTimeout(timeout_secs))??;

    let status = if result.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(result)).into_response())
}

pub async fn method_not_allowed() -> HttpAppError {
    AppError::MethodNotAllowed("Method not allowed".to_string()).into()
}

/// Walk the form, staging the file as it streams in.
///
/// Fields may arrive in any order. When the owner precedes the file it is
/// validated before the body is read; either way it is validated before any
/// object-store call.
async fn ingest_multipart(
    pipeline: &IngestionPipeline,
    mut multipart: Multipart,
) -> Result<UploadResult, HttpAppError> {
    let mut owner_id: Option<String> = None;
    let mut staged: Option<StagedUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            if staged.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                )
                .into());
            }
            if let Some(owner) = owner_id.as_deref() {
                pipeline.key_builder().validate_owner_id(owner)?;
            }
            staged = Some(pipeline.stage(field).await?);
        } else if OWNER_FIELDS.contains(&name.as_str()) {
            if owner_id.is_some() {
                return Err(AppError::InvalidInput(
                    "Send the owner identifier only once".to_string(),
                )
                .into());
            }
            owner_id = Some(read_owner_field(field).await?);
        }
    }

    let staged = staged.ok_or(AppError::MissingFile)?;
    let owner_id = owner_id
        .filter(|o| !o.is_empty())
        .ok_or(AppError::MissingOwnerId)?;

    Ok(pipeline.commit(&owner_id, staged).await?)
}

/// Read the owner field, giving up as soon as it outgrows any valid identifier.
async fn read_owner_field(mut field: Field<'_>) -> Result<String, HttpAppError> {
    let mut raw = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if raw.len() + chunk.len() > MAX_OWNER_ID_LEN {
            return Err(IngestError::InvalidOwnerId(format!(
                "must be at most {} characters",
                MAX_OWNER_ID_LEN
            ))
            .into());
        }
        raw.extend_from_slice(&chunk);
    }

    String::from_utf8(raw)
        .map_err(|_| IngestError::InvalidOwnerId("must be valid UTF-8".to_string()).into())
}
