//! Folder create/list/visibility/delete operations shared by the API layer.
//!
//! Every owner-scoped call answers [`AppError::NotFound`] for folders that are
//! missing or owned by someone else.

use crate::{
    models::{
        folder::{CreateFolderRequest, Folder, FolderWithCount, PublicFolder},
        OwnerId,
    },
    AppError, Database,
};

/// Create a private folder for `owner`.
///
/// # Returns
/// A one-element list holding the created folder with a zero bookmark count.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for invalid input, or a storage error.
pub fn create_folder(
    db: &Database,
    owner: &OwnerId,
    req: CreateFolderRequest,
) -> Result<Vec<FolderWithCount>, AppError> {
    let (name, icon) = req.validate()?;
    let folder = Folder::new(owner, name, icon);
    db.folders.create(&folder)?;
    tracing::info!(folder_id = %folder.id, owner = %owner, "Folder created");
    Ok(vec![folder.with_count(0)])
}

/// All folders owned by `owner`, oldest first, with live counts.
///
/// # Errors
/// Returns an error when storage access fails.
pub fn list_folders(db: &Database, owner: &OwnerId) -> Result<Vec<FolderWithCount>, AppError> {
    db.folders.list_for_owner(owner)
}

/// One owned folder with its count, or `None` when missing or foreign.
///
/// # Errors
/// Returns an error when storage access fails.
pub fn get_owned_folder(
    db: &Database,
    owner: &OwnerId,
    id: &str,
) -> Result<Option<FolderWithCount>, AppError> {
    Ok(db
        .folders
        .get_with_count(id)?
        .filter(|entry| entry.folder.is_owned_by(owner)))
}

/// Public view of a shared folder.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the folder is missing or private.
pub fn get_public_folder(db: &Database, id: &str) -> Result<PublicFolder, AppError> {
    db.folders
        .get_with_count(id)?
        .filter(|entry| entry.folder.is_shared)
        .map(PublicFolder::from)
        .ok_or(AppError::NotFound)
}

/// Flip the public flag on an owned folder.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the folder is missing or foreign.
pub fn update_visibility(
    db: &Database,
    owner: &OwnerId,
    id: &str,
    is_shared: bool,
) -> Result<Folder, AppError> {
    let folder = db.folders.set_visibility(owner, id, is_shared)?;
    tracing::info!(folder_id = %folder.id, is_shared, "Folder visibility changed");
    Ok(folder)
}

/// Delete an owned folder and every bookmark in it.
///
/// # Returns
/// Number of bookmarks removed.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the folder is missing or foreign.
pub fn delete_folder(db: &Database, owner: &OwnerId, id: &str) -> Result<usize, AppError> {
    let removed = db.folders.delete_cascade(owner, id)?;
    tracing::info!(folder_id = %id, bookmarks_removed = removed, "Folder deleted");
    Ok(removed)
}
