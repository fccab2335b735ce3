//! Atomic cross-table transaction helpers for bookmark mutations.
//!
//! Every helper re-reads the rows it depends on inside its own write
//! transaction, so ownership checks and the mutation they guard commit
//! together. redb serializes write transactions, which is what makes the
//! check-then-write sequences below race free.

use super::rows::{
    insert_folder_index, read_bookmark, read_folder, remove_folder_index, write_bookmark,
    write_folder,
};
use super::tables::{BOOKMARKS, BOOKMARKS_BY_FOLDER, FOLDERS};
use super::Database;
use crate::error::AppError;
use crate::models::{
    bookmark::{Bookmark, TitleSource},
    bump_timestamp,
    folder::Folder,
    OwnerId,
};

/// Atomic operations that update bookmark and folder rows together.
pub struct TransactionOps;

fn load_owned_folder(
    folders: &redb::Table<&str, &[u8]>,
    owner: &OwnerId,
    folder_id: &str,
) -> Result<Folder, AppError> {
    read_folder(folders, folder_id)?
        .filter(|folder| folder.is_owned_by(owner))
        .ok_or(AppError::NotFound)
}

fn load_owned_bookmark(
    folders: &redb::Table<&str, &[u8]>,
    bookmarks: &redb::Table<&str, &[u8]>,
    owner: &OwnerId,
    bookmark_id: &str,
) -> Result<(Bookmark, Folder), AppError> {
    let bookmark = read_bookmark(bookmarks, bookmark_id)?.ok_or(AppError::NotFound)?;
    let folder = load_owned_folder(folders, owner, &bookmark.folder_id)?;
    Ok((bookmark, folder))
}

fn touch_folder(
    folders: &mut redb::Table<&str, &[u8]>,
    mut folder: Folder,
) -> Result<(), AppError> {
    folder.updated_at = bump_timestamp(folder.updated_at);
    write_folder(folders, &folder)
}

impl TransactionOps {
    /// Atomically insert a bookmark into a folder owned by `owner`.
    ///
    /// # Arguments
    /// - `db`: Open database handle.
    /// - `owner`: Authenticated caller.
    /// - `bookmark`: Row to insert; its `folder_id` names the destination.
    ///
    /// # Returns
    /// `Ok(())` when the write commits.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the destination folder is missing or
    /// foreign, and a storage error when the id already exists or the write
    /// fails.
    pub fn create_bookmark_in_owned_folder(
        db: &Database,
        owner: &OwnerId,
        bookmark: &Bookmark,
    ) -> Result<(), AppError> {
        let write_txn = db.db.begin_write()?;
        {
            let mut folders = write_txn.open_table(FOLDERS)?;
            let mut bookmarks = write_txn.open_table(BOOKMARKS)?;
            let mut index = write_txn.open_table(BOOKMARKS_BY_FOLDER)?;

            let folder = load_owned_folder(&folders, owner, &bookmark.folder_id)?;
            if read_bookmark(&bookmarks, &bookmark.id)?.is_some() {
                return Err(AppError::StorageMessage(format!(
                    "Bookmark id '{}' already exists",
                    bookmark.id
                )));
            }
            write_bookmark(&mut bookmarks, bookmark)?;
            insert_folder_index(&mut index, bookmark)?;
            touch_folder(&mut folders, folder)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Atomically rename a bookmark whose folder is owned by `owner`.
    ///
    /// The new title is marked as user-chosen so background enrichment never
    /// overwrites it.
    ///
    /// # Returns
    /// The updated bookmark.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the bookmark is missing or lives in
    /// a foreign folder.
    pub fn update_title(
        db: &Database,
        owner: &OwnerId,
        bookmark_id: &str,
        title: String,
    ) -> Result<Bookmark, AppError> {
        let write_txn = db.db.begin_write()?;
        let updated = {
            let mut folders = write_txn.open_table(FOLDERS)?;
            let mut bookmarks = write_txn.open_table(BOOKMARKS)?;

            let (mut bookmark, folder) =
                load_owned_bookmark(&folders, &bookmarks, owner, bookmark_id)?;
            bookmark.title = title;
            bookmark.title_source = TitleSource::User;
            bookmark.updated_at = bump_timestamp(bookmark.updated_at);
            write_bookmark(&mut bookmarks, &bookmark)?;
            touch_folder(&mut folders, folder)?;
            bookmark
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Atomically move a bookmark between two folders owned by `owner`.
    ///
    /// Both the source and destination folder are re-verified inside the
    /// transaction. Moving into the current folder is accepted and only
    /// bumps timestamps.
    ///
    /// # Returns
    /// The moved bookmark.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the bookmark is missing or either
    /// folder is missing or foreign. Nothing is written in that case.
    pub fn move_bookmark(
        db: &Database,
        owner: &OwnerId,
        bookmark_id: &str,
        destination_id: &str,
    ) -> Result<Bookmark, AppError> {
        let write_txn = db.db.begin_write()?;
        let moved = {
            let mut folders = write_txn.open_table(FOLDERS)?;
            let mut bookmarks = write_txn.open_table(BOOKMARKS)?;
            let mut index = write_txn.open_table(BOOKMARKS_BY_FOLDER)?;

            let (mut bookmark, source) =
                load_owned_bookmark(&folders, &bookmarks, owner, bookmark_id)?;
            let destination = load_owned_folder(&folders, owner, destination_id)?;

            remove_folder_index(&mut index, &bookmark)?;
            bookmark.folder_id = destination.id.clone();
            bookmark.updated_at = bump_timestamp(bookmark.updated_at);
            write_bookmark(&mut bookmarks, &bookmark)?;
            insert_folder_index(&mut index, &bookmark)?;

            let same_folder = source.id == destination.id;
            touch_folder(&mut folders, source)?;
            if !same_folder {
                touch_folder(&mut folders, destination)?;
            }
            bookmark
        };
        write_txn.commit()?;
        Ok(moved)
    }

    /// Atomically delete a bookmark whose folder is owned by `owner`.
    ///
    /// # Returns
    /// The removed bookmark row.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the bookmark is missing or lives in
    /// a foreign folder.
    pub fn delete_bookmark(
        db: &Database,
        owner: &OwnerId,
        bookmark_id: &str,
    ) -> Result<Bookmark, AppError> {
        let write_txn = db.db.begin_write()?;
        let removed = {
            let mut folders = write_txn.open_table(FOLDERS)?;
            let mut bookmarks = write_txn.open_table(BOOKMARKS)?;
            let mut index = write_txn.open_table(BOOKMARKS_BY_FOLDER)?;

            let (bookmark, folder) =
                load_owned_bookmark(&folders, &bookmarks, owner, bookmark_id)?;
            remove_folder_index(&mut index, &bookmark)?;
            let _ = bookmarks.remove(bookmark.id.as_str())?;
            touch_folder(&mut folders, folder)?;
            bookmark
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
