//! Bookmark HTTP handlers.

use crate::{error::HttpError, session::Session, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use vayo_core::{
    bookmark_ops,
    models::bookmark::{Bookmark, CreateBookmarkRequest, MoveBookmarkRequest, UpdateTitleRequest},
};

/// Create a bookmark. Waits for the quick metadata fetch but not for the
/// detached enrichment pass.
///
/// # Errors
/// Returns 400 for an invalid URL and 404 when the folder is missing or foreign.
pub async fn create_bookmark(
    State(state): State<AppState>,
    Session(owner): Session,
    Json(req): Json<CreateBookmarkRequest>,
) -> Result<Json<Bookmark>, HttpError> {
    let bookmark = bookmark_ops::create_bookmark(
        &state.db,
        state.fetcher.as_ref(),
        &state.enrichment,
        &owner,
        req,
    )
    .await?;
    Ok(Json(bookmark))
}

/// Rename a bookmark.
///
/// # Errors
/// Returns 400 for an invalid title and 404 when the bookmark is missing or foreign.
pub async fn update_title(
    State(state): State<AppState>,
    Session(owner): Session,
    Path(id): Path<String>,
    Json(req): Json<UpdateTitleRequest>,
) -> Result<StatusCode, HttpError> {
    bookmark_ops::update_title(&state.db, &owner, &id, req)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a bookmark to another folder.
///
/// # Errors
/// Returns 404 when the bookmark or either folder is missing or foreign.
pub async fn move_bookmark(
    State(state): State<AppState>,
    Session(owner): Session,
    Path(id): Path<String>,
    Json(req): Json<MoveBookmarkRequest>,
) -> Result<StatusCode, HttpError> {
    bookmark_ops::move_bookmark(&state.db, &owner, &id, req)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a bookmark.
///
/// # Errors
/// Returns 404 when the bookmark is missing or foreign.
pub async fn delete_bookmark(
    State(state): State<AppState>,
    Session(owner): Session,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    bookmark_ops::delete_bookmark(&state.db, &owner, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
