//! Row encode/decode and index scan helpers usable from read and write transactions.

use super::tables::{created_key, MAX_ID_BOUND};
use crate::error::AppError;
use crate::models::{bookmark::Bookmark, folder::Folder};
use redb::{ReadableTable, Table};

type IndexKey = (&'static str, u64, &'static str);

pub(crate) fn read_folder<T>(folders: &T, id: &str) -> Result<Option<Folder>, AppError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let Some(guard) = folders.get(id)? else {
        return Ok(None);
    };
    Ok(Some(bincode::deserialize(guard.value())?))
}

pub(crate) fn read_bookmark<T>(bookmarks: &T, id: &str) -> Result<Option<Bookmark>, AppError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let Some(guard) = bookmarks.get(id)? else {
        return Ok(None);
    };
    Ok(Some(bincode::deserialize(guard.value())?))
}

/// Bookmark ids in `folder_id`, newest first. Rows created in the same
/// microsecond come out in descending id order.
pub(crate) fn folder_bookmark_ids<T>(
    index: &T,
    folder_id: &str,
    skip: usize,
    take: Option<usize>,
) -> Result<Vec<String>, AppError>
where
    T: ReadableTable<IndexKey, ()>,
{
    let start = (folder_id, 0u64, "");
    let end = (folder_id, u64::MAX, MAX_ID_BOUND);
    let mut ids = Vec::new();
    for (position, entry) in index.range(start..=end)?.rev().enumerate() {
        if position < skip {
            continue;
        }
        if take.is_some_and(|limit| ids.len() >= limit) {
            break;
        }
        let (key, _) = entry?;
        let (_, _, id) = key.value();
        ids.push(id.to_string());
    }
    Ok(ids)
}

pub(crate) fn count_folder_bookmarks<T>(index: &T, folder_id: &str) -> Result<usize, AppError>
where
    T: ReadableTable<IndexKey, ()>,
{
    let start = (folder_id, 0u64, "");
    let end = (folder_id, u64::MAX, MAX_ID_BOUND);
    let mut count = 0usize;
    for entry in index.range(start..=end)? {
        entry?;
        count += 1;
    }
    Ok(count)
}

/// Folder ids owned by `owner`, oldest first.
pub(crate) fn owner_folder_ids<T>(index: &T, owner: &str) -> Result<Vec<String>, AppError>
where
    T: ReadableTable<IndexKey, ()>,
{
    let start = (owner, 0u64, "");
    let end = (owner, u64::MAX, MAX_ID_BOUND);
    let mut ids = Vec::new();
    for entry in index.range(start..=end)? {
        let (key, _) = entry?;
        let (_, _, id) = key.value();
        ids.push(id.to_string());
    }
    Ok(ids)
}

pub(crate) fn write_folder(
    folders: &mut Table<&str, &[u8]>,
    folder: &Folder,
) -> Result<(), AppError> {
    let encoded = bincode::serialize(folder)?;
    folders.insert(folder.id.as_str(), encoded.as_slice())?;
    Ok(())
}

pub(crate) fn write_bookmark(
    bookmarks: &mut Table<&str, &[u8]>,
    bookmark: &Bookmark,
) -> Result<(), AppError> {
    let encoded = bincode::serialize(bookmark)?;
    bookmarks.insert(bookmark.id.as_str(), encoded.as_slice())?;
    Ok(())
}

pub(crate) fn insert_owner_index(
    index: &mut Table<(&str, u64, &str), ()>,
    folder: &Folder,
) -> Result<(), AppError> {
    index.insert(
        (
            folder.user_id.as_str(),
            created_key(folder.created_at),
            folder.id.as_str(),
        ),
        (),
    )?;
    Ok(())
}

pub(crate) fn remove_owner_index(
    index: &mut Table<(&str, u64, &str), ()>,
    folder: &Folder,
) -> Result<(), AppError> {
    let _ = index.remove((
        folder.user_id.as_str(),
        created_key(folder.created_at),
        folder.id.as_str(),
    ))?;
    Ok(())
}

pub(crate) fn insert_folder_index(
    index: &mut Table<(&str, u64, &str), ()>,
    bookmark: &Bookmark,
) -> Result<(), AppError> {
    index.insert(
        (
            bookmark.folder_id.as_str(),
            created_key(bookmark.created_at),
            bookmark.id.as_str(),
        ),
        (),
    )?;
    Ok(())
}

pub(crate) fn remove_folder_index(
    index: &mut Table<(&str, u64, &str), ()>,
    bookmark: &Bookmark,
) -> Result<(), AppError> {
    let _ = index.remove((
        bookmark.folder_id.as_str(),
        created_key(bookmark.created_at),
        bookmark.id.as_str(),
    ))?;
    Ok(())
}
