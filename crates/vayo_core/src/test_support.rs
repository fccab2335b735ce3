//! Shared helpers for unit tests.

use crate::db::Database;
use tempfile::TempDir;

pub(crate) fn setup_temp_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("db");
    let db = Database::new(db_path.to_str().expect("utf-8 temp path")).expect("open db");
    (db, temp_dir)
}
