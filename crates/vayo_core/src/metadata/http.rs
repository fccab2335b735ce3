//! reqwest-backed metadata fetcher.

use super::{extract_metadata, FetchError, FetchFuture, MetadataFetcher, PageMetadata};
use crate::config::Config;
use crate::constants::{FETCH_USER_AGENT, MAX_HTML_BYTES};
use reqwest::{header, redirect, Client, Url};
use std::time::Duration;

/// Fetches pages over HTTP(S) with a timeout and a redirect cap.
#[derive(Debug, Clone)]
pub struct HttpMetadataFetcher {
    client: Client,
}

fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

impl HttpMetadataFetcher {
    /// Build a fetcher.
    ///
    /// Redirects into non-http(s) schemes are not followed and surface as
    /// [`FetchError::UnsupportedScheme`].
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(timeout: Duration, max_redirects: usize) -> Result<Self, FetchError> {
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                attempt.error("too many redirects")
            } else if !is_http_scheme(attempt.url()) {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });
        let client = Client::builder()
            .timeout(timeout)
            .redirect(policy)
            .user_agent(FETCH_USER_AGENT)
            .build()
            .map_err(FetchError::Http)?;
        Ok(Self { client })
    }

    /// Build a fetcher from the metadata settings in `config`.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(config.metadata_timeout(), config.metadata_max_redirects)
    }

    async fn fetch_html(&self, url: &Url) -> Result<(Url, String), FetchError> {
        if !is_http_scheme(url) {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
        }

        let mut response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if status.is_redirection() {
            let target = response
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| response.url().join(location).ok())
                .map(|target| target.scheme().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(FetchError::UnsupportedScheme(target));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(content_type) = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            let lower = content_type.to_ascii_lowercase();
            if !lower.contains("html") {
                return Err(FetchError::NotHtml(content_type.to_string()));
            }
        }

        let final_url = response.url().clone();
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let remaining = MAX_HTML_BYTES.saturating_sub(body.len());
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                tracing::debug!(url = %final_url, limit = MAX_HTML_BYTES, "Truncated HTML body");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok((final_url, String::from_utf8_lossy(&body).into_owned()))
    }

    async fn fetch(&self, url: &Url, with_summary: bool) -> Result<PageMetadata, FetchError> {
        let (final_url, html) = self.fetch_html(url).await?;
        Ok(extract_metadata(&html, &final_url, with_summary))
    }
}

impl MetadataFetcher for HttpMetadataFetcher {
    fn fetch_metadata<'a>(&'a self, url: &'a Url) -> FetchFuture<'a> {
        Box::pin(self.fetch(url, false))
    }

    fn scrape_page<'a>(&'a self, url: &'a Url) -> FetchFuture<'a> {
        Box::pin(self.fetch(url, true))
    }
}
