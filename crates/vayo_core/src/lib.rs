//! Core domain library for Vayo (config, storage, models, enrichment).

/// Bookmark create/update/move/delete and page listing.
pub mod bookmark_ops;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across crates.
pub mod constants;
/// Database access layer and transactions.
pub mod db;
/// Detached enrichment queue and merge rules.
pub mod enrichment;
/// Process-global environment helpers used by tests and binaries.
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Folder create/list/visibility/delete operations.
pub mod folder_ops;
/// Page metadata fetching and HTML extraction.
pub mod metadata;
/// Data models for API requests and persistence.
pub mod models;
/// Page arithmetic shared by server and client.
pub mod pagination;
/// URL validation, normalization and placeholder derivation.
pub mod url;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use constants::{DEFAULT_PORT, PAGE_SIZE};
pub use db::Database;
pub use enrichment::EnrichmentQueue;
pub use error::AppError;
pub use metadata::{FetchError, MetadataFetcher, PageMetadata};
pub use models::OwnerId;
