//! Data models for API requests and persistence.

/// Bookmark models and request payloads.
pub mod bookmark;
/// Folder models and request payloads.
pub mod folder;


use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated user id as vouched for by the upstream auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    /// Construct an owner id from a caller-provided identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return this owner id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next value for an `updated_at` column.
///
/// Always strictly later than `previous`, even when the wall clock has not
/// advanced (or went backwards) since the last write.
pub fn bump_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

/// Query parameters for paged listings.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    /// Requested page, defaulting to the first one.
    pub fn page_or_first(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

pub(crate) fn trimmed_non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
