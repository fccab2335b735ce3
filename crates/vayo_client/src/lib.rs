//! Client library for Vayo: API client, paged cache and optimistic sync.

/// HTTP API client and the bookmark endpoint trait.
pub mod api;
/// Keyed cache of paged bookmark lists.
pub mod cache;
/// Client error type.
pub mod error;
/// Infinite-page loader.
pub mod pagination;
/// Last-folder preferences file.
pub mod preferences;
/// Optimistic mutations with rollback.
pub mod sync;
/// Search, month grouping and date formatting.
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, BookmarkApi};
pub use cache::{CacheKey, InfinitePages, QueryCache, Scope};
pub use error::ClientError;
pub use pagination::{PageFetch, PageLoader};
pub use preferences::{select_initial_folder, Preferences};
pub use sync::{Notice, OptimisticSync, PendingMutation};
