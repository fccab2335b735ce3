//! Concurrent writers against the same folder.

use super::*;

#[test]
fn concurrent_creates_keep_counts_consistent() {
    let (db, _temp) = setup_test_db();
    let db = Arc::new(db);
    let owner = OwnerId::new("alice");
    let folder = owned_folder(&db, &owner, "Shared inbox");

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let db = db.clone();
            let owner = owner.clone();
            let folder_id = folder.id.clone();
            thread::spawn(move || {
                for item in 0..5 {
                    let bookmark = bookmark_at(
                        &folder_id,
                        &format!("w{worker}-i{item}.example.com"),
                        Utc::now(),
                    );
                    TransactionOps::create_bookmark_in_owned_folder(&db, &owner, &bookmark)
                        .expect("create");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }

    let counted = db.folders.get_with_count(&folder.id).unwrap().unwrap();
    assert_eq!(counted.total_bookmarks, 40);
}

#[test]
fn delete_racing_move_never_leaves_orphans() {
    let (db, _temp) = setup_test_db();
    let db = Arc::new(db);
    let owner = OwnerId::new("alice");
    let doomed = owned_folder(&db, &owner, "Doomed");
    let refuge = owned_folder(&db, &owner, "Refuge");
    let bookmark = bookmark_at(&doomed.id, "example.com", Utc::now());
    TransactionOps::create_bookmark_in_owned_folder(&db, &owner, &bookmark).unwrap();

    let mover = {
        let db = db.clone();
        let owner = owner.clone();
        let bookmark_id = bookmark.id.clone();
        let refuge_id = refuge.id.clone();
        thread::spawn(move || TransactionOps::move_bookmark(&db, &owner, &bookmark_id, &refuge_id))
    };
    let deleted = db.folders.delete_cascade(&owner, &doomed.id).unwrap();
    let moved = mover.join().expect("mover");

    match (moved, deleted) {
        (Ok(_), 0) => {
            let stored = db.bookmarks.get(&bookmark.id).unwrap().unwrap();
            assert_eq!(stored.folder_id, refuge.id);
        }
        (Err(AppError::NotFound), 1) => {
            assert!(db.bookmarks.get(&bookmark.id).unwrap().is_none());
        }
        (moved, deleted) => panic!("inconsistent race outcome: {:?} / {}", moved, deleted),
    }
    assert!(db.folders.get(&doomed.id).unwrap().is_none());
}
