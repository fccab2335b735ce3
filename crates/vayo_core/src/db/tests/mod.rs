//! Database integration tests.

use super::*;
use crate::error::AppError;
use crate::metadata::PageMetadata;
use crate::models::{bookmark::*, folder::*, OwnerId};
use crate::url::normalize_bookmark_url;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn setup_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(db_path.to_str().unwrap()).unwrap();
    (db, temp_dir)
}

fn owned_folder(db: &Database, owner: &OwnerId, name: &str) -> Folder {
    let folder = Folder::new(owner, name.to_string(), None);
    db.folders.create(&folder).expect("create folder");
    folder
}

fn bookmark_at(folder_id: &str, url: &str, created_at: DateTime<Utc>) -> Bookmark {
    let url = normalize_bookmark_url(url).expect("url");
    let mut bookmark = Bookmark::new(folder_id.to_string(), &url, PageMetadata::default());
    bookmark.created_at = created_at;
    bookmark.updated_at = created_at;
    bookmark
}

mod concurrency;
mod paging;
