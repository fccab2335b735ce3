//! Page metadata fetching and HTML extraction.
//!
//! A [`MetadataFetcher`] turns a URL into a [`PageMetadata`]. Failures are
//! reported as [`FetchError`] but never travel past the bookmark service:
//! callers go through [`fetch_or_default`] and proceed with empty fields.

mod http;
mod parse;

pub use http::HttpMetadataFetcher;
pub use parse::extract_metadata;

use crate::config::Config;
use reqwest::Url;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Fields scraped from a page. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub og_image_url: Option<String>,
    pub summary: Option<String>,
}

impl PageMetadata {
    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.favicon_url.is_none()
            && self.og_image_url.is_none()
            && self.summary.is_none()
    }
}

/// Reasons a metadata fetch produced nothing.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Response is not HTML ({0})")]
    NotHtml(String),

    #[error("Metadata fetch timed out")]
    Timeout,

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Metadata fetching is disabled")]
    Disabled,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_redirect() {
            FetchError::TooManyRedirects
        } else {
            FetchError::Http(err)
        }
    }
}

/// Boxed future returned by [`MetadataFetcher`] methods.
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PageMetadata, FetchError>> + Send + 'a>>;

/// Source of page metadata.
pub trait MetadataFetcher: Send + Sync {
    /// Quick fetch used while a bookmark is being created: title,
    /// description, favicon and preview image.
    fn fetch_metadata<'a>(&'a self, url: &'a Url) -> FetchFuture<'a>;

    /// Full-page scrape used by detached enrichment. Adds a text summary.
    fn scrape_page<'a>(&'a self, url: &'a Url) -> FetchFuture<'a>;
}

/// Fetcher used when `METADATA_FETCH` is off. Always fails with
/// [`FetchError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFetcher;

impl MetadataFetcher for DisabledFetcher {
    fn fetch_metadata<'a>(&'a self, _url: &'a Url) -> FetchFuture<'a> {
        Box::pin(async { Err(FetchError::Disabled) })
    }

    fn scrape_page<'a>(&'a self, _url: &'a Url) -> FetchFuture<'a> {
        Box::pin(async { Err(FetchError::Disabled) })
    }
}

/// Fetcher selected by `config`: HTTP when `METADATA_FETCH` is on, else
/// [`DisabledFetcher`].
///
/// # Errors
/// Returns an error when the HTTP client cannot be constructed.
pub fn fetcher_from_config(config: &Config) -> Result<Arc<dyn MetadataFetcher>, FetchError> {
    if config.metadata_fetch_enabled {
        Ok(Arc::new(HttpMetadataFetcher::from_config(config)?))
    } else {
        tracing::info!("Metadata fetching disabled; bookmarks keep placeholder fields");
        Ok(Arc::new(DisabledFetcher))
    }
}

/// Run the quick fetch and swallow any failure into empty metadata.
pub async fn fetch_or_default(fetcher: &dyn MetadataFetcher, url: &Url) -> PageMetadata {
    let started = Instant::now();
    match fetcher.fetch_metadata(url).await {
        Ok(metadata) => {
            tracing::debug!(
                url = %url,
                elapsed_ms = started.elapsed().as_millis() as u64,
                has_title = metadata.title.is_some(),
                "Metadata fetch completed"
            );
            metadata
        }
        Err(FetchError::Disabled) => PageMetadata::default(),
        Err(err) => {
            tracing::warn!(
                url = %url,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "Metadata fetch failed; using placeholder fields"
            );
            PageMetadata::default()
        }
    }
}
