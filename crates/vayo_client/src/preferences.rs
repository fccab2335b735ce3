//! Small JSON file remembering the last opened folder.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use vayo_core::config::resolve_home_dir;
use vayo_core::models::folder::FolderWithCount;

/// Environment override for the preferences file location.
pub const PREFERENCES_PATH_ENV: &str = "VAYO_PREFERENCES";

/// Persisted client preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub last_folder_id: Option<String>,
}

impl Preferences {
    /// `VAYO_PREFERENCES`, else `~/.config/vayo/preferences.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(PREFERENCES_PATH_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        resolve_home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("vayo")
            .join("preferences.json")
    }

    /// Read preferences, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to read preferences");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Ignoring corrupt preferences"
                );
                Self::default()
            }
        }
    }

    /// Write preferences, creating parent directories as needed.
    ///
    /// # Errors
    /// Returns an I/O error when the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)
    }

    pub fn remember_folder(&mut self, folder_id: &str) {
        self.last_folder_id = Some(folder_id.to_string());
    }
}

/// Folder to open on startup: the remembered one if it still exists, else
/// the first (oldest) folder.
pub fn select_initial_folder<'a>(
    folders: &'a [FolderWithCount],
    prefs: &Preferences,
) -> Option<&'a FolderWithCount> {
    prefs
        .last_folder_id
        .as_deref()
        .and_then(|id| folders.iter().find(|f| f.folder.id == id))
        .or_else(|| folders.first())
}
