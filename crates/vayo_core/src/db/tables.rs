//! redb table definitions shared by storage modules.

use chrono::{DateTime, Utc};
use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Canonical folder rows (`Folder`, bincode-encoded).
pub const FOLDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("folders");
/// Owner index ordered by creation micros then id (oldest first).
pub const FOLDERS_BY_OWNER: TableDefinition<(&str, u64, &str), ()> =
    TableDefinition::new("folders_by_owner");
/// Canonical bookmark rows (`Bookmark`, bincode-encoded).
pub const BOOKMARKS: TableDefinition<&str, &[u8]> = TableDefinition::new("bookmarks");
/// Folder index ordered by creation micros then id, scanned in reverse for
/// newest first.
pub const BOOKMARKS_BY_FOLDER: TableDefinition<(&str, u64, &str), ()> =
    TableDefinition::new("bookmarks_by_folder");

/// Upper bound for the id component of index range scans.
pub(crate) const MAX_ID_BOUND: &str = "\u{10ffff}";

/// Creation-order key. Pre-epoch timestamps clamp to zero.
pub(crate) fn created_key(created_at: DateTime<Utc>) -> u64 {
    created_at.timestamp_micros().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn created_key_orders_older_rows_first() {
        let older = Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).single().expect("ts");
        let newer = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("ts");
        assert!(created_key(older) < created_key(newer));
    }

    #[test]
    fn pre_epoch_timestamps_clamp() {
        let pre_epoch = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).single().expect("ts");
        assert_eq!(created_key(pre_epoch), 0);
    }
}
