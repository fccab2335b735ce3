//! Optimistic bookmark mutations.
//!
//! Each mutation runs in two phases. `begin_*` snapshots the affected lists
//! and applies a speculative edit to the cache, returning a
//! [`PendingMutation`]. Once the server answers, [`OptimisticSync::settle`]
//! either invalidates and refetches the lists (success) or restores the
//! snapshots and records a [`Notice`] (failure).
//!
//! Pending mutations are independent: two in flight on the same list each
//! restore their own snapshot, and whichever settles last wins.

use crate::api::BookmarkApi;
use crate::cache::{CacheKey, InfinitePages, QueryCache};
use crate::error::ClientError;
use crate::pagination::PageLoader;
use chrono::Utc;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vayo_core::models::bookmark::{Bookmark, TitleSource, UpdateTitleRequest};
use vayo_core::url::{favicon_guess, normalize_bookmark_url, placeholder_title};

/// Which user action a mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Rename,
    Move,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "add bookmark",
            Self::Rename => "rename bookmark",
            Self::Move => "move bookmark",
            Self::Delete => "delete bookmark",
        })
    }
}

/// User-visible failure message produced when a mutation is rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: MutationKind,
    pub message: String,
}

/// A speculative edit waiting for the server's answer.
#[must_use = "a pending mutation must be settled"]
#[derive(Debug)]
pub struct PendingMutation {
    kind: MutationKind,
    snapshots: Vec<(CacheKey, Option<InfinitePages>)>,
    optimistic: Option<Bookmark>,
}

impl PendingMutation {
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Placeholder row inserted by a create.
    pub fn optimistic_row(&self) -> Option<&Bookmark> {
        self.optimistic.as_ref()
    }

    /// Lists this mutation touched.
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.snapshots.iter().map(|(key, _)| key)
    }
}

fn temp_id() -> String {
    format!(
        "temp-{}-{:08x}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}

/// Build the placeholder row shown while a create is in flight.
///
/// # Errors
/// Returns [`ClientError::InvalidUrl`] when the input is not a bookmarkable
/// URL.
pub fn optimistic_bookmark(folder_id: &str, raw_url: &str) -> Result<Bookmark, ClientError> {
    let url = normalize_bookmark_url(raw_url)
        .map_err(|_| ClientError::InvalidUrl(raw_url.trim().to_string()))?;
    let now = Utc::now();
    Ok(Bookmark {
        id: temp_id(),
        folder_id: folder_id.to_string(),
        url: url.as_str().to_string(),
        title: placeholder_title(url.parsed()),
        title_source: TitleSource::Placeholder,
        description: None,
        favicon_url: favicon_guess(url.parsed()),
        og_image_url: None,
        summary: None,
        created_at: now,
        updated_at: now,
    })
}

/// Optimistic mutation driver over a shared [`QueryCache`].
pub struct OptimisticSync<A> {
    loader: PageLoader<A>,
    api: Arc<A>,
    notices: Mutex<Vec<Notice>>,
}

impl<A: BookmarkApi> OptimisticSync<A> {
    pub fn new(api: Arc<A>, cache: Arc<QueryCache>) -> Self {
        Self {
            loader: PageLoader::new(api.clone(), cache),
            api,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn loader(&self) -> &PageLoader<A> {
        &self.loader
    }

    pub fn cache(&self) -> &QueryCache {
        self.loader.cache()
    }

    fn notices(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take every notice recorded since the last call.
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices())
    }

    fn pending(&self, kind: MutationKind, keys: &[CacheKey]) -> PendingMutation {
        PendingMutation {
            kind,
            snapshots: keys
                .iter()
                .map(|key| (key.clone(), self.cache().snapshot(key)))
                .collect(),
            optimistic: None,
        }
    }

    /// Show a placeholder row at the head of the folder's first page.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidUrl`] without touching the cache when
    /// `raw_url` is not a bookmarkable URL.
    pub fn begin_create(
        &self,
        folder_id: &str,
        raw_url: &str,
    ) -> Result<PendingMutation, ClientError> {
        let row = optimistic_bookmark(folder_id, raw_url)?;
        let key = CacheKey::owned(folder_id);
        let mut pending = self.pending(MutationKind::Create, &[key.clone()]);
        self.cache().update(&key, |pages| pages.prepend(row.clone()));
        pending.optimistic = Some(row);
        Ok(pending)
    }

    /// Patch the cached title of `bookmark_id` in `folder_id`.
    ///
    /// # Errors
    /// Returns [`ClientError::Validation`] without touching the cache for a
    /// blank or oversized title.
    pub fn begin_update_title(
        &self,
        folder_id: &str,
        bookmark_id: &str,
        title: &str,
    ) -> Result<PendingMutation, ClientError> {
        let title = UpdateTitleRequest {
            title: title.to_string(),
        }
        .validate()
        .map_err(|err| ClientError::Validation(err.to_string()))?;
        let key = CacheKey::owned(folder_id);
        let pending = self.pending(MutationKind::Rename, &[key.clone()]);
        self.cache().update(&key, |pages| {
            pages.patch(bookmark_id, |bookmark| {
                bookmark.title = title;
                bookmark.title_source = TitleSource::User;
            })
        });
        Ok(pending)
    }

    /// Drop `bookmark_id` from the cached list of `folder_id`.
    pub fn begin_delete(&self, folder_id: &str, bookmark_id: &str) -> PendingMutation {
        let key = CacheKey::owned(folder_id);
        let pending = self.pending(MutationKind::Delete, &[key.clone()]);
        self.cache().update(&key, |pages| pages.remove(bookmark_id));
        pending
    }

    /// Drop `bookmark_id` from the origin list. The destination is only
    /// refreshed after the server confirms.
    pub fn begin_move(
        &self,
        from_folder_id: &str,
        bookmark_id: &str,
        to_folder_id: &str,
    ) -> PendingMutation {
        let origin = CacheKey::owned(from_folder_id);
        let mut keys = vec![origin.clone()];
        if from_folder_id != to_folder_id {
            keys.push(CacheKey::owned(to_folder_id));
        }
        let pending = self.pending(MutationKind::Move, &keys);
        if from_folder_id != to_folder_id {
            self.cache().update(&origin, |pages| pages.remove(bookmark_id));
        }
        pending
    }

    /// Resolve a pending mutation with the server's answer.
    ///
    /// On success every touched list is invalidated and, when cached,
    /// refetched. When a page fetch for the list is already running, that
    /// fetch reloads the list once it finishes. A failed refetch is logged
    /// and leaves the list stale for the next fetch to reload; it does not
    /// turn the mutation into a failure. On error the snapshots are
    /// put back exactly and a [`Notice`] is recorded.
    ///
    /// # Returns
    /// `result`, unchanged.
    pub async fn settle<T>(
        &self,
        pending: PendingMutation,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        match &result {
            Ok(_) => {
                for (key, _) in &pending.snapshots {
                    self.cache().invalidate(key);
                    if self.cache().snapshot(key).is_none() {
                        continue;
                    }
                    match self.loader.refetch(key).await {
                        Ok(true) => {}
                        Ok(false) => tracing::debug!(
                            folder_id = %key.folder_id,
                            "Refetch deferred to in-flight page fetch"
                        ),
                        Err(err) => tracing::warn!(
                            folder_id = %key.folder_id,
                            error = %err,
                            "Refetch after {} failed",
                            pending.kind
                        ),
                    }
                }
            }
            Err(err) => {
                for (key, snapshot) in pending.snapshots {
                    self.cache().restore(&key, snapshot);
                }
                tracing::warn!(error = %err, "Failed to {}; rolled back", pending.kind);
                self.notices().push(Notice {
                    kind: pending.kind,
                    message: format!("Failed to {}: {}", pending.kind, err),
                });
            }
        }
        result
    }

    /// Optimistically add a bookmark.
    ///
    /// # Errors
    /// [`ClientError::InvalidUrl`] before anything is sent, or the API error
    /// after the cache was rolled back.
    pub async fn create_bookmark(
        &self,
        folder_id: &str,
        raw_url: &str,
    ) -> Result<Bookmark, ClientError> {
        let pending = self.begin_create(folder_id, raw_url)?;
        let url = pending
            .optimistic_row()
            .map(|row| row.url.clone())
            .unwrap_or_else(|| raw_url.trim().to_string());
        let result = self.api.create_bookmark(&url, folder_id).await;
        self.settle(pending, result).await
    }

    /// Optimistically rename a bookmark.
    ///
    /// # Errors
    /// [`ClientError::Validation`] before anything is sent, or the API error
    /// after the cache was rolled back.
    pub async fn update_title(
        &self,
        folder_id: &str,
        bookmark_id: &str,
        title: &str,
    ) -> Result<(), ClientError> {
        let pending = self.begin_update_title(folder_id, bookmark_id, title)?;
        let result = self.api.update_title(bookmark_id, title.trim()).await;
        self.settle(pending, result).await
    }

    /// Optimistically delete a bookmark.
    ///
    /// # Errors
    /// The API error, after the cache was rolled back.
    pub async fn delete_bookmark(
        &self,
        folder_id: &str,
        bookmark_id: &str,
    ) -> Result<(), ClientError> {
        let pending = self.begin_delete(folder_id, bookmark_id);
        let result = self.api.delete_bookmark(bookmark_id).await;
        self.settle(pending, result).await
    }

    /// Optimistically move a bookmark between folders.
    ///
    /// # Errors
    /// The API error, after the origin list was rolled back.
    pub async fn move_bookmark(
        &self,
        from_folder_id: &str,
        bookmark_id: &str,
        to_folder_id: &str,
    ) -> Result<(), ClientError> {
        let pending = self.begin_move(from_folder_id, bookmark_id, to_folder_id);
        let result = self.api.move_bookmark(bookmark_id, to_folder_id).await;
        self.settle(pending, result).await
    }
}
