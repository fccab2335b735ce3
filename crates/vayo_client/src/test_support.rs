//! In-memory [`BookmarkApi`] for exercising the cache layers.

use crate::api::BookmarkApi;
use crate::cache::Scope;
use crate::error::ClientError;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use vayo_core::metadata::PageMetadata;
use vayo_core::models::bookmark::Bookmark;
use vayo_core::url::normalize_bookmark_url;
use vayo_core::PAGE_SIZE;

pub(crate) fn bookmark(id: &str, folder_id: &str) -> Bookmark {
    let url = normalize_bookmark_url("example.com").expect("url");
    let mut row = Bookmark::new(folder_id.to_string(), &url, PageMetadata::default());
    row.id = id.to_string();
    row
}

/// Folder id to bookmarks, newest first.
#[derive(Default)]
pub(crate) struct FakeApi {
    folders: Mutex<HashMap<String, Vec<Bookmark>>>,
    fail_mutations: AtomicBool,
    list_calls: AtomicUsize,
    list_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub(crate) fn with_bookmarks(folder_id: &str, count: usize) -> Self {
        let api = Self::default();
        let now = Utc::now();
        let rows = (0..count)
            .map(|i| {
                let mut row = bookmark(&format!("{}-{}", folder_id, i), folder_id);
                row.created_at = now - Duration::seconds(i as i64);
                row
            })
            .collect();
        api.folders
            .lock()
            .expect("lock")
            .insert(folder_id.to_string(), rows);
        api
    }

    pub(crate) fn add_folder(&self, folder_id: &str) {
        self.folders
            .lock()
            .expect("lock")
            .entry(folder_id.to_string())
            .or_default();
    }

    /// Make every following mutation fail with a server error.
    pub(crate) fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Hold list calls until the returned gate is notified.
    pub(crate) fn gate_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().expect("lock") = Some(gate.clone());
        gate
    }

    /// Let the held list call through and stop gating later ones.
    pub(crate) fn open_gate(&self) {
        if let Some(gate) = self.list_gate.lock().expect("lock").take() {
            gate.notify_one();
        }
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stored(&self, folder_id: &str) -> Vec<Bookmark> {
        self.folders
            .lock()
            .expect("lock")
            .get(folder_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_failure(&self) -> Result<(), ClientError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(ClientError::Server {
                status: 500,
                message: "Database error".to_string(),
            });
        }
        Ok(())
    }

    fn find_folder_of(&self, bookmark_id: &str) -> Option<String> {
        self.folders
            .lock()
            .expect("lock")
            .iter()
            .find(|(_, rows)| rows.iter().any(|b| b.id == bookmark_id))
            .map(|(folder_id, _)| folder_id.clone())
    }
}

impl BookmarkApi for FakeApi {
    async fn list_bookmarks(
        &self,
        _scope: Scope,
        folder_id: &str,
        page: u32,
    ) -> Result<Vec<Bookmark>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gate.lock().expect("lock").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if page == 0 {
            return Err(ClientError::Validation("page must be 1 or greater".to_string()));
        }
        let folders = self.folders.lock().expect("lock");
        let rows = folders.get(folder_id).ok_or(ClientError::NotFound)?;
        let offset = (page as usize - 1) * PAGE_SIZE;
        Ok(rows.iter().skip(offset).take(PAGE_SIZE).cloned().collect())
    }

    async fn create_bookmark(&self, url: &str, folder_id: &str) -> Result<Bookmark, ClientError> {
        self.check_failure()?;
        let url = normalize_bookmark_url(url)
            .map_err(|err| ClientError::Validation(err.to_string()))?;
        let created = Bookmark::new(folder_id.to_string(), &url, PageMetadata::default());
        let mut folders = self.folders.lock().expect("lock");
        let rows = folders.get_mut(folder_id).ok_or(ClientError::NotFound)?;
        rows.insert(0, created.clone());
        Ok(created)
    }

    async fn update_title(&self, bookmark_id: &str, title: &str) -> Result<(), ClientError> {
        self.check_failure()?;
        let mut folders = self.folders.lock().expect("lock");
        let row = folders
            .values_mut()
            .flatten()
            .find(|b| b.id == bookmark_id)
            .ok_or(ClientError::NotFound)?;
        row.title = title.to_string();
        Ok(())
    }

    async fn move_bookmark(&self, bookmark_id: &str, folder_id: &str) -> Result<(), ClientError> {
        self.check_failure()?;
        let source = self.find_folder_of(bookmark_id).ok_or(ClientError::NotFound)?;
        let mut folders = self.folders.lock().expect("lock");
        if !folders.contains_key(folder_id) {
            return Err(ClientError::NotFound);
        }
        let rows = folders.get_mut(&source).ok_or(ClientError::NotFound)?;
        let pos = rows
            .iter()
            .position(|b| b.id == bookmark_id)
            .ok_or(ClientError::NotFound)?;
        let mut moved = rows.remove(pos);
        moved.folder_id = folder_id.to_string();
        let destination = folders.entry(folder_id.to_string()).or_default();
        let at = destination
            .iter()
            .position(|b| b.created_at < moved.created_at)
            .unwrap_or(destination.len());
        destination.insert(at, moved);
        Ok(())
    }

    async fn delete_bookmark(&self, bookmark_id: &str) -> Result<(), ClientError> {
        self.check_failure()?;
        let mut folders = self.folders.lock().expect("lock");
        for rows in folders.values_mut() {
            if let Some(pos) = rows.iter().position(|b| b.id == bookmark_id) {
                rows.remove(pos);
                return Ok(());
            }
        }
        Err(ClientError::NotFound)
    }
}
