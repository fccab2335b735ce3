//! Bookmark storage operations backed by redb.

use super::rows::{folder_bookmark_ids, read_bookmark, write_bookmark};
use super::tables::{BOOKMARKS, BOOKMARKS_BY_FOLDER};
use crate::enrichment::merge_enrichment;
use crate::error::AppError;
use crate::metadata::PageMetadata;
use crate::models::{bookmark::Bookmark, bump_timestamp};
use crate::pagination::PageRequest;
use redb::ReadableDatabase;
use std::sync::Arc;

/// Result of applying background metadata to a stored bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// The bookmark was deleted before enrichment finished.
    Missing,
    /// Every field the metadata could fill was already set.
    Unchanged,
    /// At least one field was filled in.
    Updated,
}

/// Accessor for bookmark tables.
pub struct BookmarkDb {
    db: Arc<redb::Database>,
}

impl BookmarkDb {
    /// Initialize bookmark tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(BOOKMARKS)?;
        write_txn.open_table(BOOKMARKS_BY_FOLDER)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Fetch a bookmark by id.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: &str) -> Result<Option<Bookmark>, AppError> {
        let read_txn = self.db.begin_read()?;
        let bookmarks = read_txn.open_table(BOOKMARKS)?;
        read_bookmark(&bookmarks, id)
    }

    /// One page of a folder's bookmarks, newest first.
    ///
    /// Reads the index and rows from a single snapshot so a concurrent insert
    /// cannot shift rows between the two lookups.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list_page(&self, folder_id: &str, page: PageRequest) -> Result<Vec<Bookmark>, AppError> {
        let read_txn = self.db.begin_read()?;
        let bookmarks = read_txn.open_table(BOOKMARKS)?;
        let index = read_txn.open_table(BOOKMARKS_BY_FOLDER)?;

        let ids = folder_bookmark_ids(&index, folder_id, page.offset(), Some(page.size()))?;
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            match read_bookmark(&bookmarks, &id)? {
                Some(bookmark) => rows.push(bookmark),
                None => {
                    tracing::warn!(
                        folder_id,
                        bookmark_id = %id,
                        "Folder index points at a missing bookmark"
                    );
                }
            }
        }
        Ok(rows)
    }

    /// Merge background metadata into an existing bookmark.
    ///
    /// Only unset fields are filled; a user-chosen or metadata title is left
    /// alone. Applying the same metadata twice is a no-op the second time.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn apply_enrichment(
        &self,
        id: &str,
        metadata: &PageMetadata,
    ) -> Result<EnrichmentOutcome, AppError> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut bookmarks = write_txn.open_table(BOOKMARKS)?;
            match read_bookmark(&bookmarks, id)? {
                None => EnrichmentOutcome::Missing,
                Some(mut bookmark) => {
                    if merge_enrichment(&mut bookmark, metadata) {
                        bookmark.updated_at = bump_timestamp(bookmark.updated_at);
                        write_bookmark(&mut bookmarks, &bookmark)?;
                        EnrichmentOutcome::Updated
                    } else {
                        EnrichmentOutcome::Unchanged
                    }
                }
            }
        };
        if outcome == EnrichmentOutcome::Updated {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }
}
