//! Keyed cache of infinitely paged bookmark lists.
//!
//! One entry per `(scope, folder)` list. Entries carry the loaded pages, a
//! stale flag set by invalidation, and an in-flight flag that suppresses
//! overlapping page fetches for the same list.
//!
//! A stale list accepts no more appended pages; the next fetch for it
//! reloads the whole list instead. Every invalidation bumps a generation
//! counter so a reload that raced a newer invalidation leaves the list stale.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use vayo_core::models::bookmark::Bookmark;
use vayo_core::pagination::next_page_param;

/// Which listing endpoint a cached list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The owner's private view.
    Owned,
    /// The unauthenticated view of a shared folder.
    Shared,
}

/// Cache key for one folder's bookmark list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scope: Scope,
    pub folder_id: String,
}

impl CacheKey {
    pub fn owned(folder_id: impl Into<String>) -> Self {
        Self {
            scope: Scope::Owned,
            folder_id: folder_id.into(),
        }
    }

    pub fn shared(folder_id: impl Into<String>) -> Self {
        Self {
            scope: Scope::Shared,
            folder_id: folder_id.into(),
        }
    }
}

/// Pages loaded so far for one list, newest bookmarks first.
///
/// `page_params[i]` is the page number that produced `pages[i]`, and
/// `fetched_lens[i]` the number of rows the server returned for it.
/// Optimistic edits change `pages` but never `fetched_lens`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfinitePages {
    pub pages: Vec<Vec<Bookmark>>,
    pub page_params: Vec<u32>,
    pub fetched_lens: Vec<usize>,
}

impl InfinitePages {
    /// Page number to request next, or `None` once the server returned a
    /// short page.
    pub fn next_page_param(&self) -> Option<u32> {
        let last_len = self.fetched_lens.last().copied().unwrap_or(0);
        next_page_param(last_len, self.pages.len())
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page_param().is_some()
    }

    /// All loaded bookmarks in display order.
    pub fn items(&self) -> impl Iterator<Item = &Bookmark> {
        self.pages.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn push_page(&mut self, param: u32, rows: Vec<Bookmark>) {
        self.fetched_lens.push(rows.len());
        self.pages.push(rows);
        self.page_params.push(param);
    }

    /// Insert at the head of the first page.
    pub(crate) fn prepend(&mut self, bookmark: Bookmark) {
        match self.pages.first_mut() {
            Some(first) => first.insert(0, bookmark),
            None => {
                self.pages.push(vec![bookmark]);
                self.page_params.push(1);
                self.fetched_lens.push(0);
            }
        }
    }

    /// Apply `patch` to the bookmark with `id`. Returns whether it was found.
    pub(crate) fn patch(&mut self, id: &str, patch: impl FnOnce(&mut Bookmark)) -> bool {
        match self.pages.iter_mut().flatten().find(|b| b.id == id) {
            Some(bookmark) => {
                patch(bookmark);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Bookmark> {
        for page in &mut self.pages {
            if let Some(pos) = page.iter().position(|b| b.id == id) {
                return Some(page.remove(pos));
            }
        }
        None
    }
}

#[derive(Debug, Default)]
struct Entry {
    data: Option<InfinitePages>,
    stale: bool,
    fetching: bool,
    generation: u64,
}

/// Thread-safe keyed store of [`InfinitePages`].
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves plain data behind; keep serving it.
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exact copy of the cached pages, suitable for [`QueryCache::restore`].
    pub fn snapshot(&self, key: &CacheKey) -> Option<InfinitePages> {
        self.lock().get(key).and_then(|entry| entry.data.clone())
    }

    /// Replace the cached pages and clear the stale flag.
    pub fn set(&self, key: &CacheKey, data: InfinitePages) {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_default();
        entry.data = Some(data);
        entry.stale = false;
    }

    /// Store a reloaded list read at `generation`.
    ///
    /// The pages are stored either way. The stale flag is only cleared when
    /// no invalidation happened since `generation` was read.
    ///
    /// # Returns
    /// Whether the list is now fresh.
    pub fn set_if_current(&self, key: &CacheKey, data: InfinitePages, generation: u64) -> bool {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_default();
        entry.data = Some(data);
        if entry.generation == generation {
            entry.stale = false;
        }
        !entry.stale
    }

    /// Put back a snapshot taken earlier. Restoring `None` drops the pages.
    pub fn restore(&self, key: &CacheKey, snapshot: Option<InfinitePages>) {
        let mut entries = self.lock();
        match snapshot {
            Some(data) => entries.entry(key.clone()).or_default().data = Some(data),
            None => {
                if let Some(entry) = entries.get_mut(key) {
                    entry.data = None;
                }
            }
        }
    }

    /// Mutate cached pages in place. Returns `None` when nothing is cached.
    pub fn update<R>(&self, key: &CacheKey, f: impl FnOnce(&mut InfinitePages) -> R) -> Option<R> {
        self.lock()
            .get_mut(key)
            .and_then(|entry| entry.data.as_mut())
            .map(f)
    }

    /// Append a freshly fetched page.
    ///
    /// Dropped when the list is stale, or when it no longer lines up with
    /// the cached pages because the list was replaced while the fetch was
    /// in flight.
    ///
    /// # Returns
    /// Whether the page was stored.
    pub fn append_page(&self, key: &CacheKey, param: u32, rows: Vec<Bookmark>) -> bool {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_default();
        if entry.stale {
            tracing::debug!(
                folder_id = %key.folder_id,
                page = param,
                "Discarding page for stale list"
            );
            return false;
        }
        let data = entry.data.get_or_insert_with(InfinitePages::default);
        if data.next_page_param() != Some(param) {
            tracing::debug!(
                folder_id = %key.folder_id,
                page = param,
                "Discarding out-of-sequence page"
            );
            return false;
        }
        data.push_page(param, rows);
        true
    }

    /// Mark a list as needing a refetch.
    pub fn invalidate(&self, key: &CacheKey) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.stale = true;
            entry.generation += 1;
        }
    }

    /// Invalidation counter for `key`, read before a reload starts.
    pub fn generation(&self, key: &CacheKey) -> u64 {
        self.lock().get(key).map_or(0, |entry| entry.generation)
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.lock().get(key).is_some_and(|entry| entry.stale)
    }

    /// Claim the in-flight slot for `key`. `false` if a fetch is already running.
    pub fn try_begin_fetch(&self, key: &CacheKey) -> bool {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_default();
        if entry.fetching {
            return false;
        }
        entry.fetching = true;
        true
    }

    pub fn end_fetch(&self, key: &CacheKey) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.fetching = false;
        }
    }

    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.lock().get(key).is_some_and(|entry| entry.fetching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bookmark;
    use vayo_core::PAGE_SIZE;

    fn full_page(folder: &str, start: usize) -> Vec<Bookmark> {
        (start..start + PAGE_SIZE)
            .map(|i| bookmark(&format!("b{}", i), folder))
            .collect()
    }

    #[test]
    fn next_page_follows_page_lengths() {
        let mut pages = InfinitePages::default();
        assert_eq!(pages.next_page_param(), Some(1));
        pages.push_page(1, full_page("f", 0));
        assert_eq!(pages.next_page_param(), Some(2));
        pages.push_page(2, vec![bookmark("last", "f")]);
        assert!(!pages.has_next_page());
        assert_eq!(pages.len(), PAGE_SIZE + 1);
    }

    #[test]
    fn prepend_patch_and_remove() {
        let mut pages = InfinitePages::default();
        pages.prepend(bookmark("a", "f"));
        pages.prepend(bookmark("b", "f"));
        assert_eq!(pages.page_params, vec![1]);
        let ids: Vec<&str> = pages.items().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert!(pages.patch("a", |b| b.title = "renamed".to_string()));
        assert!(!pages.patch("missing", |_| {}));
        assert_eq!(pages.remove("a").map(|b| b.title), Some("renamed".to_string()));
        assert!(pages.remove("a").is_none());
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn restore_puts_back_exact_snapshot() {
        let cache = QueryCache::new();
        let key = CacheKey::owned("f");
        assert!(cache.snapshot(&key).is_none());

        assert!(cache.append_page(&key, 1, vec![bookmark("a", "f")]));
        let before = cache.snapshot(&key);
        cache.update(&key, |pages| pages.prepend(bookmark("tmp", "f")));
        assert_ne!(cache.snapshot(&key), before);

        cache.restore(&key, before.clone());
        assert_eq!(cache.snapshot(&key), before);

        cache.restore(&key, None);
        assert!(cache.snapshot(&key).is_none());
    }

    #[test]
    fn update_without_data_is_none() {
        let cache = QueryCache::new();
        assert!(cache
            .update(&CacheKey::owned("f"), |pages| pages.len())
            .is_none());
    }

    #[test]
    fn out_of_sequence_pages_are_dropped() {
        let cache = QueryCache::new();
        let key = CacheKey::owned("f");
        assert!(!cache.append_page(&key, 2, full_page("f", 0)));
        assert!(cache.append_page(&key, 1, full_page("f", 0)));
        assert!(!cache.append_page(&key, 1, full_page("f", 30)));
        assert!(cache.append_page(&key, 2, vec![]));
        assert_eq!(cache.snapshot(&key).map(|p| p.page_params), Some(vec![1, 2]));
    }

    #[test]
    fn invalidate_marks_stale_until_set() {
        let cache = QueryCache::new();
        let key = CacheKey::shared("f");
        cache.invalidate(&key);
        assert!(!cache.is_stale(&key), "nothing cached yet");

        cache.set(&key, InfinitePages::default());
        cache.invalidate(&key);
        assert!(cache.is_stale(&key));
        cache.set(&key, InfinitePages::default());
        assert!(!cache.is_stale(&key));
    }

    #[test]
    fn local_removal_keeps_next_page_available() {
        let mut pages = InfinitePages::default();
        pages.push_page(1, full_page("f", 0));
        pages.push_page(2, full_page("f", 30));
        assert!(pages.remove("b3").is_some());
        assert!(pages.remove("b40").is_some());
        assert_eq!(pages.next_page_param(), Some(3));
        assert_eq!(pages.fetched_lens, vec![PAGE_SIZE, PAGE_SIZE]);
    }

    #[test]
    fn stale_list_rejects_appends() {
        let cache = QueryCache::new();
        let key = CacheKey::owned("f");
        assert!(cache.append_page(&key, 1, full_page("f", 0)));
        cache.invalidate(&key);
        assert!(!cache.append_page(&key, 2, full_page("f", 30)));
        assert_eq!(cache.snapshot(&key).map(|p| p.len()), Some(PAGE_SIZE));
    }

    #[test]
    fn reload_racing_invalidation_stays_stale() {
        let cache = QueryCache::new();
        let key = CacheKey::owned("f");
        cache.set(&key, InfinitePages::default());
        cache.invalidate(&key);

        let generation = cache.generation(&key);
        cache.invalidate(&key);
        assert!(!cache.set_if_current(&key, InfinitePages::default(), generation));
        assert!(cache.is_stale(&key));

        let generation = cache.generation(&key);
        assert!(cache.set_if_current(&key, InfinitePages::default(), generation));
        assert!(!cache.is_stale(&key));
    }

    #[test]
    fn fetch_slot_is_exclusive_per_key() {
        let cache = QueryCache::new();
        let a = CacheKey::owned("a");
        let b = CacheKey::owned("b");
        assert!(cache.try_begin_fetch(&a));
        assert!(!cache.try_begin_fetch(&a));
        assert!(cache.try_begin_fetch(&b));
        assert!(cache.is_fetching(&a));
        cache.end_fetch(&a);
        assert!(!cache.is_fetching(&a));
        assert!(cache.try_begin_fetch(&a));
    }

    #[test]
    fn owned_and_shared_keys_are_distinct() {
        let cache = QueryCache::new();
        cache.append_page(&CacheKey::owned("f"), 1, vec![bookmark("a", "f")]);
        assert!(cache.snapshot(&CacheKey::shared("f")).is_none());
    }
}
