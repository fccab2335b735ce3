//! Read-only endpoints for shared folders. No session required.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use vayo_core::{
    bookmark_ops, folder_ops,
    models::{
        bookmark::Bookmark,
        folder::{FolderPreviewQuery, PublicFolder},
        PageQuery,
    },
    AppError,
};

/// Public view of a shared folder.
///
/// # Errors
/// Returns 404 when the folder is missing or private.
pub async fn get_public_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicFolder>, HttpError> {
    Ok(Json(folder_ops::get_public_folder(&state.db, &id)?))
}

/// One page of a shared folder's bookmarks, newest first.
///
/// # Errors
/// Returns 400 for page 0 and 404 when the folder is missing or private.
pub async fn list_public_bookmarks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Bookmark>>, HttpError> {
    let page = query.page_or_first();
    Ok(Json(bookmark_ops::list_shared_page(&state.db, &id, page)?))
}

/// Link-preview lookup: `GET /api/getFolderById?folderId=...`.
///
/// # Errors
/// Returns 400 when `folderId` is absent and 404 unless the folder is shared.
pub async fn folder_preview(
    State(state): State<AppState>,
    Query(query): Query<FolderPreviewQuery>,
) -> Result<Json<PublicFolder>, HttpError> {
    let folder_id = query
        .folder_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("folderId is required".to_string()))?;
    Ok(Json(folder_ops::get_public_folder(&state.db, folder_id)?))
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}
