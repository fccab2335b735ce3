//! Folder storage operations backed by redb.

use super::rows::{
    count_folder_bookmarks, folder_bookmark_ids, insert_owner_index, owner_folder_ids,
    read_bookmark, read_folder, remove_folder_index, remove_owner_index, write_folder,
};
use super::tables::{BOOKMARKS, BOOKMARKS_BY_FOLDER, FOLDERS, FOLDERS_BY_OWNER};
use crate::error::AppError;
use crate::models::{
    bump_timestamp,
    folder::{Folder, FolderWithCount},
    OwnerId,
};
use redb::ReadableDatabase;
use std::sync::Arc;

/// Accessor for folder tables.
pub struct FolderDb {
    db: Arc<redb::Database>,
}

impl FolderDb {
    /// Initialize folder tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(FOLDERS)?;
        write_txn.open_table(FOLDERS_BY_OWNER)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert a new folder row and its owner index entry.
    ///
    /// # Errors
    /// Returns an error when the id already exists, serialization fails, or
    /// storage operations fail.
    pub fn create(&self, folder: &Folder) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut folders = write_txn.open_table(FOLDERS)?;
            let mut by_owner = write_txn.open_table(FOLDERS_BY_OWNER)?;
            if read_folder(&folders, &folder.id)?.is_some() {
                return Err(AppError::StorageMessage(format!(
                    "Folder id '{}' already exists",
                    folder.id
                )));
            }
            write_folder(&mut folders, folder)?;
            insert_owner_index(&mut by_owner, folder)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Fetch a folder by id regardless of owner.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: &str) -> Result<Option<Folder>, AppError> {
        let read_txn = self.db.begin_read()?;
        let folders = read_txn.open_table(FOLDERS)?;
        read_folder(&folders, id)
    }

    /// Fetch a folder with its live bookmark count.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get_with_count(&self, id: &str) -> Result<Option<FolderWithCount>, AppError> {
        let read_txn = self.db.begin_read()?;
        let folders = read_txn.open_table(FOLDERS)?;
        let index = read_txn.open_table(BOOKMARKS_BY_FOLDER)?;
        let Some(folder) = read_folder(&folders, id)? else {
            return Ok(None);
        };
        let total = count_folder_bookmarks(&index, &folder.id)?;
        Ok(Some(folder.with_count(total)))
    }

    /// List folders owned by `owner`, oldest first, each with its live
    /// bookmark count.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<FolderWithCount>, AppError> {
        let read_txn = self.db.begin_read()?;
        let folders = read_txn.open_table(FOLDERS)?;
        let by_owner = read_txn.open_table(FOLDERS_BY_OWNER)?;
        let index = read_txn.open_table(BOOKMARKS_BY_FOLDER)?;

        let mut listed = Vec::new();
        for id in owner_folder_ids(&by_owner, owner.as_str())? {
            let Some(folder) = read_folder(&folders, &id)? else {
                tracing::warn!(folder_id = %id, "Owner index points at a missing folder");
                continue;
            };
            let total = count_folder_bookmarks(&index, &folder.id)?;
            listed.push(folder.with_count(total));
        }
        Ok(listed)
    }

    /// Set the public flag on a folder owned by `owner`.
    ///
    /// # Returns
    /// The updated folder.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the folder is missing or owned by
    /// someone else.
    pub fn set_visibility(
        &self,
        owner: &OwnerId,
        id: &str,
        is_shared: bool,
    ) -> Result<Folder, AppError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut folders = write_txn.open_table(FOLDERS)?;
            let mut folder = read_folder(&folders, id)?
                .filter(|folder| folder.is_owned_by(owner))
                .ok_or(AppError::NotFound)?;
            folder.is_shared = is_shared;
            folder.updated_at = bump_timestamp(folder.updated_at);
            write_folder(&mut folders, &folder)?;
            folder
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a folder owned by `owner` together with every bookmark in it.
    ///
    /// # Returns
    /// Number of bookmarks removed by the cascade.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the folder is missing or owned by
    /// someone else.
    pub fn delete_cascade(&self, owner: &OwnerId, id: &str) -> Result<usize, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut folders = write_txn.open_table(FOLDERS)?;
            let mut by_owner = write_txn.open_table(FOLDERS_BY_OWNER)?;
            let mut bookmarks = write_txn.open_table(BOOKMARKS)?;
            let mut index = write_txn.open_table(BOOKMARKS_BY_FOLDER)?;

            let folder = read_folder(&folders, id)?
                .filter(|folder| folder.is_owned_by(owner))
                .ok_or(AppError::NotFound)?;

            let ids = folder_bookmark_ids(&index, &folder.id, 0, None)?;
            for bookmark_id in &ids {
                match read_bookmark(&bookmarks, bookmark_id)? {
                    Some(bookmark) => {
                        remove_folder_index(&mut index, &bookmark)?;
                        let _ = bookmarks.remove(bookmark_id.as_str())?;
                    }
                    None => {
                        tracing::warn!(
                            folder_id = %folder.id,
                            bookmark_id = %bookmark_id,
                            "Folder index points at a missing bookmark"
                        );
                    }
                }
            }

            remove_owner_index(&mut by_owner, &folder)?;
            let _ = folders.remove(folder.id.as_str())?;
            ids.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
