//! Folder models and request payloads.

use super::{trimmed_non_empty, OwnerId};
use crate::constants::{MAX_FOLDER_ICON_CHARS, MAX_FOLDER_NAME_CHARS};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Folder row as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Folder annotated with its live bookmark count, as returned to owners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FolderWithCount {
    #[serde(flatten)]
    pub folder: Folder,
    pub total_bookmarks: usize,
}

/// Read-only view of a shared folder. Omits the owner reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicFolder {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_bookmarks: usize,
}

/// Request payload for creating a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFolderRequest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Request payload for toggling folder visibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateVisibilityRequest {
    pub is_shared: bool,
}

/// Query for the unauthenticated folder preview endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPreviewQuery {
    pub folder_id: Option<String>,
}

impl CreateFolderRequest {
    /// Trim and bound the name and icon.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for an empty or oversized name, or an
    /// oversized icon.
    pub fn validate(self) -> Result<(String, Option<String>), AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Folder name is required".to_string()));
        }
        if name.chars().count() > MAX_FOLDER_NAME_CHARS {
            return Err(AppError::BadRequest(format!(
                "Folder name exceeds {} characters",
                MAX_FOLDER_NAME_CHARS
            )));
        }
        let icon = trimmed_non_empty(self.icon);
        if let Some(ref icon) = icon {
            if icon.chars().count() > MAX_FOLDER_ICON_CHARS {
                return Err(AppError::BadRequest(format!(
                    "Folder icon exceeds {} characters",
                    MAX_FOLDER_ICON_CHARS
                )));
            }
        }
        Ok((name, icon))
    }
}

impl Folder {
    /// Create a private folder owned by `owner`.
    pub fn new(owner: &OwnerId, name: String, icon: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: owner.as_str().to_string(),
            name,
            icon,
            is_shared: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `owner` may mutate or privately read this folder.
    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        self.user_id == owner.as_str()
    }

    /// Attach a bookmark count.
    pub fn with_count(self, total_bookmarks: usize) -> FolderWithCount {
        FolderWithCount {
            folder: self,
            total_bookmarks,
        }
    }
}

impl From<FolderWithCount> for PublicFolder {
    fn from(value: FolderWithCount) -> Self {
        let FolderWithCount {
            folder,
            total_bookmarks,
        } = value;
        Self {
            id: folder.id,
            name: folder.name,
            icon: folder.icon,
            is_shared: folder.is_shared,
            created_at: folder.created_at,
            updated_at: folder.updated_at,
            total_bookmarks,
        }
    }
}
