//! Shared constants used across Vayo crates.

/// Default API port for the Vayo server.
pub const DEFAULT_PORT: u16 = 3000;

/// Number of bookmarks served per page. Clients treat a shorter page as the end of the list.
pub const PAGE_SIZE: usize = 30;

/// Default maximum request body size accepted by the API layer.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Default header carrying the authenticated user id, injected by the upstream auth provider.
pub const DEFAULT_AUTH_HEADER: &str = "x-vayo-user";

/// Default metadata fetch timeout in milliseconds.
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 10_000;

/// Default cap on redirects followed by the metadata fetcher.
pub const DEFAULT_METADATA_MAX_REDIRECTS: usize = 10;

/// Default number of detached enrichment jobs allowed to run at once.
pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 4;

/// Default number of enrichment jobs waiting for a worker slot. Jobs beyond
/// this are dropped and the bookmark keeps its placeholder metadata.
pub const DEFAULT_ENRICHMENT_QUEUE_CAPACITY: usize = 1024;

/// Upper bound on HTML bytes parsed per fetched page.
pub const MAX_HTML_BYTES: usize = 2 * 1024 * 1024;

/// Upper bound on generated summary length, in characters.
pub const SUMMARY_MAX_CHARS: usize = 600;

/// Title used when neither metadata nor the hostname yields one.
pub const UNTITLED: &str = "Untitled";

/// Maximum accepted folder name length, in characters.
pub const MAX_FOLDER_NAME_CHARS: usize = 64;

/// Maximum accepted folder icon length, in characters.
pub const MAX_FOLDER_ICON_CHARS: usize = 16;

/// Maximum accepted bookmark title length, in characters.
pub const MAX_TITLE_CHARS: usize = 500;

/// User agent sent by the metadata fetcher.
pub const FETCH_USER_AGENT: &str = concat!("vayo-metadata/", env!("CARGO_PKG_VERSION"));

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://localhost:3000";
