//! Database layer and transactional helpers for Vayo.

/// Bookmark storage helpers.
pub mod bookmark;
/// Folder storage helpers.
pub mod folder;
pub(crate) mod rows;
/// redb table definitions.
pub mod tables;
/// Ownership-checked multi-table mutations.
pub mod transactions;

pub use transactions::TransactionOps;

use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;

/// Database handle with access to the folder and bookmark tables.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub folders: folder::FolderDb,
    pub bookmarks: bookmark::BookmarkDb,
}

#[cfg(test)]
mod tests;

impl Database {
    /// Open (or create) the database under the directory `path` and
    /// initialize all tables.
    ///
    /// # Returns
    /// A fully initialized [`Database`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, redb cannot open
    /// the file, or table initialization fails.
    pub fn new(path: &str) -> Result<Self, AppError> {
        std::fs::create_dir_all(path).map_err(|err| {
            AppError::StorageMessage(format!(
                "Failed to create database directory '{}': {}",
                path, err
            ))
        })?;
        let file = Path::new(path).join(tables::REDB_FILE_NAME);

        let db = match redb::Database::create(&file) {
            Ok(db) => Arc::new(db),
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(AppError::StorageMessage(format!(
                    "Database at '{}' is already open in another process.\n\
                    Stop the other vayo-server instance, or set DB_PATH to a different location.",
                    file.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        Self::from_shared(db)
    }

    /// Build a database handle from an already-open redb instance.
    ///
    /// # Errors
    /// Returns an error if the required tables cannot be created.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, AppError> {
        Ok(Self {
            folders: folder::FolderDb::new(db.clone())?,
            bookmarks: bookmark::BookmarkDb::new(db.clone())?,
            db,
        })
    }
}
