//! Folder HTTP handlers.

use crate::{error::HttpError, session::Session, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use vayo_core::{
    bookmark_ops, folder_ops,
    models::{
        bookmark::Bookmark,
        folder::{CreateFolderRequest, FolderWithCount, UpdateVisibilityRequest},
        PageQuery,
    },
};

/// List the caller's folders, oldest first, with bookmark counts.
///
/// # Errors
/// Returns an error if listing fails.
pub async fn list_folders(
    State(state): State<AppState>,
    Session(owner): Session,
) -> Result<Json<Vec<FolderWithCount>>, HttpError> {
    Ok(Json(folder_ops::list_folders(&state.db, &owner)?))
}

/// Create a folder.
///
/// # Returns
/// A one-element list with the created folder.
///
/// # Errors
/// Returns an error if validation or persistence fails.
pub async fn create_folder(
    State(state): State<AppState>,
    Session(owner): Session,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<Vec<FolderWithCount>>, HttpError> {
    Ok(Json(folder_ops::create_folder(&state.db, &owner, req)?))
}

/// Fetch one of the caller's folders. Answers `null` when the folder is
/// missing or belongs to someone else.
///
/// # Errors
/// Returns an error if storage access fails.
pub async fn get_folder(
    State(state): State<AppState>,
    Session(owner): Session,
    Path(id): Path<String>,
) -> Result<Json<Option<FolderWithCount>>, HttpError> {
    Ok(Json(folder_ops::get_owned_folder(&state.db, &owner, &id)?))
}

/// Share or unshare a folder.
///
/// # Errors
/// Returns 404 when the folder is missing or foreign.
pub async fn update_visibility(
    State(state): State<AppState>,
    Session(owner): Session,
    Path(id): Path<String>,
    Json(req): Json<UpdateVisibilityRequest>,
) -> Result<StatusCode, HttpError> {
    folder_ops::update_visibility(&state.db, &owner, &id, req.is_shared)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a folder and all of its bookmarks.
///
/// # Errors
/// Returns 404 when the folder is missing or foreign.
pub async fn delete_folder(
    State(state): State<AppState>,
    Session(owner): Session,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    folder_ops::delete_folder(&state.db, &owner, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// One page of the caller's bookmarks in a folder, newest first.
///
/// # Errors
/// Returns 400 for page 0 and 404 when the folder is missing or foreign.
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Session(owner): Session,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Bookmark>>, HttpError> {
    let page = query.page_or_first();
    Ok(Json(bookmark_ops::list_owned_page(
        &state.db, &owner, &id, page,
    )?))
}
