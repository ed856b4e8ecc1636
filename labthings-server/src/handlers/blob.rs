use labthings_core::error::AppError;
use labthings_core::http::{HeaderMap, IntoResponse, Path, State};
use uuid::Uuid;

use crate::state::AppState;

/// Streams a registered blob's raw bytes back with its declared media type
/// (spec.md 4.5). Blobs disappear once the invocation that produced them
/// falls out of its retention window, at which point this 404s same as any
/// other unknown id.
pub async fn get_blob(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    let blob = state
        .server
        .blobs
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("blob '{id}'")))?;

    let bytes = blob
        .read()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut headers = HeaderMap::new();
    let content_type = blob
        .media_type()
        .parse()
        .unwrap_or_else(|_| "application/octet-stream".parse().unwrap());
    headers.insert(axum::http::header::CONTENT_TYPE, content_type);

    Ok((headers, bytes))
}
