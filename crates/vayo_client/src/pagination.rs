//! Infinite-page loading on top of [`QueryCache`].

use crate::api::BookmarkApi;
use crate::cache::{CacheKey, InfinitePages, QueryCache};
use crate::error::ClientError;
use std::sync::Arc;
use vayo_core::PAGE_SIZE;

/// Reloads attempted before a list that keeps being invalidated is left stale.
const MAX_RELOADS: usize = 3;

/// Outcome of [`PageLoader::fetch_next_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFetch {
    /// Page `page` was fetched and appended.
    Loaded { page: u32, count: usize },
    /// The list was stale, so its first `pages` pages were fetched again and
    /// replaced the cached list.
    Reloaded { pages: usize },
    /// Another fetch for the same list was already running.
    Suppressed,
    /// The last loaded page was short; there is nothing more to load.
    Exhausted,
}

/// Releases the in-flight slot on every exit path, including cancellation.
struct FetchGuard<'a> {
    cache: &'a QueryCache,
    key: &'a CacheKey,
}

impl<'a> FetchGuard<'a> {
    fn acquire(cache: &'a QueryCache, key: &'a CacheKey) -> Option<Self> {
        cache
            .try_begin_fetch(key)
            .then_some(Self { cache, key })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.cache.end_fetch(self.key);
    }
}

/// Loads bookmark pages into the shared cache.
pub struct PageLoader<A> {
    api: Arc<A>,
    cache: Arc<QueryCache>,
}

impl<A> Clone for PageLoader<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<A: BookmarkApi> PageLoader<A> {
    pub fn new(api: Arc<A>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Whether another page may exist. True before the first page loads.
    pub fn has_next_page(&self, key: &CacheKey) -> bool {
        self.cache
            .snapshot(key)
            .map_or(true, |pages| pages.has_next_page())
    }

    /// Fetch the page after the last loaded one.
    ///
    /// A call made while another fetch for `key` is in flight does nothing
    /// and reports [`PageFetch::Suppressed`]. A stale list is reloaded
    /// instead of extended, including when it went stale while the page
    /// request was in flight.
    ///
    /// # Errors
    /// Propagates the API error; the cache is left as it was.
    pub async fn fetch_next_page(&self, key: &CacheKey) -> Result<PageFetch, ClientError> {
        let Some(_guard) = FetchGuard::acquire(&self.cache, key) else {
            return Ok(PageFetch::Suppressed);
        };
        let cached = self.cache.snapshot(key);
        if self.cache.is_stale(key) {
            let loaded = cached.map_or(0, |pages| pages.pages.len());
            return self.reload(key, page_count(loaded)).await;
        }
        let next = cached.map_or(Some(1), |pages| pages.next_page_param());
        let Some(page) = next else {
            return Ok(PageFetch::Exhausted);
        };

        let rows = self
            .api
            .list_bookmarks(key.scope, &key.folder_id, page)
            .await?;
        let count = rows.len();
        if !self.cache.append_page(key, page, rows) {
            if self.cache.is_stale(key) {
                return self.reload(key, page).await;
            }
            return Ok(PageFetch::Suppressed);
        }
        tracing::debug!(folder_id = %key.folder_id, page, count, "Loaded bookmark page");
        Ok(PageFetch::Loaded { page, count })
    }

    /// Load every remaining page.
    ///
    /// # Returns
    /// The fully loaded list.
    ///
    /// # Errors
    /// Propagates the first API error.
    pub async fn fetch_all(&self, key: &CacheKey) -> Result<InfinitePages, ClientError> {
        loop {
            match self.fetch_next_page(key).await? {
                PageFetch::Loaded { .. } | PageFetch::Reloaded { .. } => continue,
                PageFetch::Exhausted | PageFetch::Suppressed => break,
            }
        }
        Ok(self.cache.snapshot(key).unwrap_or_default())
    }

    /// Re-fetch as many pages as are currently loaded (at least one) and
    /// replace the cached list in one step.
    ///
    /// # Returns
    /// `false` when skipped because a fetch for `key` was already running.
    /// The list stays marked stale, and that fetch reloads it when it
    /// finishes.
    ///
    /// # Errors
    /// Propagates the API error; the cache is left as it was.
    pub async fn refetch(&self, key: &CacheKey) -> Result<bool, ClientError> {
        let Some(_guard) = FetchGuard::acquire(&self.cache, key) else {
            return Ok(false);
        };
        let loaded = self
            .cache
            .snapshot(key)
            .map_or(0, |pages| pages.pages.len());
        self.reload(key, page_count(loaded)).await?;
        Ok(true)
    }

    // Caller holds the in-flight slot for `key`.
    async fn reload(&self, key: &CacheKey, wanted: u32) -> Result<PageFetch, ClientError> {
        let mut pages = 0;
        for _ in 0..MAX_RELOADS {
            let generation = self.cache.generation(key);
            let fresh = self.fetch_pages(key, wanted).await?;
            pages = fresh.pages.len();
            if self.cache.set_if_current(key, fresh, generation) {
                tracing::debug!(folder_id = %key.folder_id, pages, "Reloaded bookmark list");
                return Ok(PageFetch::Reloaded { pages });
            }
        }
        tracing::warn!(
            folder_id = %key.folder_id,
            attempts = MAX_RELOADS,
            "Bookmark list kept changing during reload; left stale"
        );
        Ok(PageFetch::Reloaded { pages })
    }

    async fn fetch_pages(&self, key: &CacheKey, wanted: u32) -> Result<InfinitePages, ClientError> {
        let mut fresh = InfinitePages::default();
        for page in 1..=wanted.max(1) {
            let rows = self
                .api
                .list_bookmarks(key.scope, &key.folder_id, page)
                .await?;
            let short = rows.len() < PAGE_SIZE;
            fresh.push_page(page, rows);
            if short {
                break;
            }
        }
        Ok(fresh)
    }
}

fn page_count(loaded: usize) -> u32 {
    u32::try_from(loaded).unwrap_or(u32::MAX).max(1)
}
