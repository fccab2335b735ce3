//! Bookmark models and request payloads.

use crate::constants::MAX_TITLE_CHARS;
use crate::error::AppError;
use crate::metadata::PageMetadata;
use crate::url::BookmarkUrl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a bookmark's current title came from.
///
/// Enrichment may only replace [`TitleSource::Placeholder`] titles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TitleSource {
    /// Derived from the hostname (or `Untitled`) because no metadata was available.
    #[default]
    Placeholder,
    /// Taken from the page's own metadata.
    Metadata,
    /// Set explicitly by the owner.
    User,
}

/// Bookmark row as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub folder_id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub title_source: TitleSource,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub og_image_url: Option<String>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBookmarkRequest {
    pub url: String,
    pub folder_id: String,
}

/// Request payload for renaming a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTitleRequest {
    pub title: String,
}

/// Request payload for moving a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveBookmarkRequest {
    pub folder_id: String,
}

impl CreateBookmarkRequest {
    /// Validate the folder id and normalize the URL (`example.com` becomes
    /// `https://example.com`).
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for a blank folder id or malformed URL.
    pub fn validate(self) -> Result<(String, BookmarkUrl), AppError> {
        let folder_id = self.folder_id.trim().to_string();
        if folder_id.is_empty() {
            return Err(AppError::BadRequest("folderId is required".to_string()));
        }
        let url = crate::url::normalize_bookmark_url(&self.url)?;
        Ok((folder_id, url))
    }
}

impl UpdateTitleRequest {
    /// Trim and bound the new title.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for an empty or oversized title.
    pub fn validate(self) -> Result<String, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Title exceeds {} characters",
                MAX_TITLE_CHARS
            )));
        }
        Ok(title)
    }
}

impl Bookmark {
    /// Build a new bookmark row from whatever metadata the synchronous fetch
    /// produced.
    ///
    /// The title falls back to the hostname-derived placeholder, so it is
    /// never empty.
    pub fn new(folder_id: String, url: &BookmarkUrl, metadata: PageMetadata) -> Self {
        let now = Utc::now();
        let (title, title_source) = match metadata.title {
            Some(title) => (title, TitleSource::Metadata),
            None => (
                crate::url::placeholder_title(url.parsed()),
                TitleSource::Placeholder,
            ),
        };
        Self {
            id: Uuid::now_v7().to_string(),
            folder_id,
            url: url.as_str().to_string(),
            title,
            title_source,
            description: metadata.description,
            favicon_url: metadata.favicon_url,
            og_image_url: metadata.og_image_url,
            summary: metadata.summary,
            created_at: now,
            updated_at: now,
        }
    }
}
