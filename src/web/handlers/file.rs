//! Document handlers for Web API.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::file::{decode_original_name, is_supported, sanitize_file_name, DocumentRecord};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Multipart field carrying the uploaded document.
pub const UPLOAD_FIELD: &str = "file";

/// GET /api/files - List stored documents.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DocumentRecord>>, ApiError> {
    let records = state.registry.list().await?;
    Ok(Json(records))
}

/// POST /api/files - Upload a document.
///
/// Request body: multipart/form-data with a single "file" field.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentRecord>), ApiError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        // Both the client's name and the name it is stored under must pass;
        // an empty name would otherwise get the placeholder extension.
        let stored_name = sanitize_file_name(&original_name);
        if !is_supported(decode_original_name(&original_name).trim())
            || !is_supported(&stored_name)
        {
            return Err(ApiError::bad_request("unsupported file type"));
        }

        let content = field.bytes().await?;
        upload = Some((original_name, content));
        break;
    }

    let (name, content) = upload.ok_or_else(|| ApiError::bad_request("no file uploaded"))?;
    let record = state.registry.store(&content, &name).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /api/files/:id - Delete a document.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
