//! Bookmark create/update/move/delete and page listing.

use crate::{
    db::TransactionOps,
    enrichment::{EnrichmentJob, EnrichmentQueue},
    metadata::{fetch_or_default, MetadataFetcher},
    models::{
        bookmark::{Bookmark, CreateBookmarkRequest, MoveBookmarkRequest, UpdateTitleRequest},
        folder::Folder,
        OwnerId,
    },
    pagination::PageRequest,
    AppError, Database,
};
use std::time::Instant;

fn owned_folder(db: &Database, owner: &OwnerId, folder_id: &str) -> Result<Folder, AppError> {
    db.folders
        .get(folder_id)?
        .filter(|folder| folder.is_owned_by(owner))
        .ok_or(AppError::NotFound)
}

/// Create a bookmark in a folder owned by `owner`.
///
/// The URL is normalized, page metadata is fetched with the fetcher's own
/// timeout and redirect limits, and the row is persisted with whatever the
/// fetch produced (placeholder fields on failure). A detached enrichment job
/// is queued afterwards; this call does not wait for it.
///
/// # Returns
/// The persisted bookmark.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for invalid input and
/// [`AppError::NotFound`] when the folder is missing or foreign. Metadata
/// failures never surface here.
pub async fn create_bookmark(
    db: &Database,
    fetcher: &dyn MetadataFetcher,
    queue: &EnrichmentQueue,
    owner: &OwnerId,
    req: CreateBookmarkRequest,
) -> Result<Bookmark, AppError> {
    let started = Instant::now();
    let (folder_id, url) = req.validate()?;
    owned_folder(db, owner, &folder_id)?;

    let metadata = fetch_or_default(fetcher, url.parsed()).await;
    let fetched_ms = started.elapsed().as_millis() as u64;

    let bookmark = Bookmark::new(folder_id, &url, metadata);
    let insert_started = Instant::now();
    TransactionOps::create_bookmark_in_owned_folder(db, owner, &bookmark)?;
    let insert_ms = insert_started.elapsed().as_millis() as u64;

    queue.enqueue(EnrichmentJob {
        bookmark_id: bookmark.id.clone(),
        url: url.parsed().clone(),
    });

    tracing::info!(
        bookmark_id = %bookmark.id,
        folder_id = %bookmark.folder_id,
        title_source = ?bookmark.title_source,
        fetched_ms,
        insert_ms,
        total_ms = started.elapsed().as_millis() as u64,
        "Bookmark created"
    );
    Ok(bookmark)
}

/// Rename a bookmark whose folder is owned by `owner`.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for an invalid title and
/// [`AppError::NotFound`] when the bookmark is missing or foreign.
pub fn update_title(
    db: &Database,
    owner: &OwnerId,
    id: &str,
    req: UpdateTitleRequest,
) -> Result<Bookmark, AppError> {
    let title = req.validate()?;
    TransactionOps::update_title(db, owner, id, title)
}

/// Move a bookmark into another folder owned by `owner`.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the bookmark, its current folder or
/// the destination is missing or foreign.
pub fn move_bookmark(
    db: &Database,
    owner: &OwnerId,
    id: &str,
    req: MoveBookmarkRequest,
) -> Result<Bookmark, AppError> {
    let destination = req.folder_id.trim();
    if destination.is_empty() {
        return Err(AppError::BadRequest("folderId is required".to_string()));
    }
    let moved = TransactionOps::move_bookmark(db, owner, id, destination)?;
    tracing::debug!(bookmark_id = %moved.id, folder_id = %moved.folder_id, "Bookmark moved");
    Ok(moved)
}

/// Delete a bookmark whose folder is owned by `owner`.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the bookmark is missing or foreign.
pub fn delete_bookmark(db: &Database, owner: &OwnerId, id: &str) -> Result<(), AppError> {
    let removed = TransactionOps::delete_bookmark(db, owner, id)?;
    tracing::debug!(bookmark_id = %removed.id, "Bookmark deleted");
    Ok(())
}

/// One page of an owned folder's bookmarks, newest first.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for page 0 and [`AppError::NotFound`]
/// when the folder is missing or foreign.
pub fn list_owned_page(
    db: &Database,
    owner: &OwnerId,
    folder_id: &str,
    page: u32,
) -> Result<Vec<Bookmark>, AppError> {
    let page = PageRequest::new(page)?;
    owned_folder(db, owner, folder_id)?;
    db.bookmarks.list_page(folder_id, page)
}

/// One page of a shared folder's bookmarks, newest first. No owner needed.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for page 0 and [`AppError::NotFound`]
/// when the folder is missing or private.
pub fn list_shared_page(
    db: &Database,
    folder_id: &str,
    page: u32,
) -> Result<Vec<Bookmark>, AppError> {
    let page = PageRequest::new(page)?;
    db.folders
        .get(folder_id)?
        .filter(|folder| folder.is_shared)
        .ok_or(AppError::NotFound)?;
    db.bookmarks.list_page(folder_id, page)
}
