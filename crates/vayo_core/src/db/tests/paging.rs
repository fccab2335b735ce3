//! Newest-first page listing.

use super::*;
use crate::constants::PAGE_SIZE;
use crate::pagination::PageRequest;
use std::collections::HashSet;

#[test]
fn pages_are_disjoint_and_newest_first() {
    let (db, _temp) = setup_test_db();
    let owner = OwnerId::new("alice");
    let folder = owned_folder(&db, &owner, "Big");
    let base = Utc::now() - Duration::hours(1);

    for offset in 0..45 {
        let bookmark = bookmark_at(
            &folder.id,
            &format!("site{offset}.example.com"),
            base + Duration::seconds(offset),
        );
        TransactionOps::create_bookmark_in_owned_folder(&db, &owner, &bookmark).unwrap();
    }

    let first = db.bookmarks.list_page(&folder.id, PageRequest::new(1).unwrap()).unwrap();
    let second = db.bookmarks.list_page(&folder.id, PageRequest::new(2).unwrap()).unwrap();
    let third = db.bookmarks.list_page(&folder.id, PageRequest::new(3).unwrap()).unwrap();
    assert_eq!(first.len(), PAGE_SIZE);
    assert_eq!(second.len(), 15);
    assert!(third.is_empty());

    let all: Vec<_> = first.iter().chain(second.iter()).collect();
    let ids: HashSet<_> = all.iter().map(|bookmark| bookmark.id.as_str()).collect();
    assert_eq!(ids.len(), 45);
    assert!(all
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert_eq!(first[0].url, "https://site44.example.com");
}

#[test]
fn equal_timestamps_still_page_without_overlap() {
    let (db, _temp) = setup_test_db();
    let owner = OwnerId::new("alice");
    let folder = owned_folder(&db, &owner, "Burst");
    let instant = Utc::now();

    for offset in 0..4 {
        let bookmark = bookmark_at(&folder.id, &format!("burst{offset}.example.com"), instant);
        TransactionOps::create_bookmark_in_owned_folder(&db, &owner, &bookmark).unwrap();
    }

    let first = db
        .bookmarks
        .list_page(&folder.id, PageRequest::with_size(1, 3).unwrap())
        .unwrap();
    let second = db
        .bookmarks
        .list_page(&folder.id, PageRequest::with_size(2, 3).unwrap())
        .unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 1);
    assert!(first.iter().all(|bookmark| bookmark.id != second[0].id));
}

#[test]
fn equal_timestamps_list_higher_id_first() {
    let (db, _temp) = setup_test_db();
    let owner = OwnerId::new("alice");
    let folder = owned_folder(&db, &owner, "Burst");
    let instant = Utc::now();

    for (id, url) in [("0001", "first.example.com"), ("0002", "second.example.com")] {
        let mut bookmark = bookmark_at(&folder.id, url, instant);
        bookmark.id = id.to_string();
        TransactionOps::create_bookmark_in_owned_folder(&db, &owner, &bookmark).unwrap();
    }
    let newer = bookmark_at(&folder.id, "third.example.com", instant + Duration::microseconds(1));
    TransactionOps::create_bookmark_in_owned_folder(&db, &owner, &newer).unwrap();

    let page = db.bookmarks.list_page(&folder.id, PageRequest::new(1).unwrap()).unwrap();
    let ids: Vec<&str> = page.iter().map(|bookmark| bookmark.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), "0002", "0001"]);
}

#[test]
fn listing_unknown_folder_is_empty() {
    let (db, _temp) = setup_test_db();
    let page = db.bookmarks.list_page("missing", PageRequest::new(1).unwrap()).unwrap();
    assert!(page.is_empty());
}
