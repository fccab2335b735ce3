//! Command-line client for the Vayo API.

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vayo_client::view::{filter_bookmarks, format_date, group_by_month};
use vayo_client::{
    select_initial_folder, ApiClient, BookmarkApi, CacheKey, ClientError, PageLoader,
    Preferences, QueryCache, Scope,
};
use vayo_core::models::bookmark::Bookmark;
use vayo_core::models::folder::FolderWithCount;
use vayo_core::constants::DEFAULT_CLI_SERVER_URL;

#[derive(Parser)]
#[command(name = "vayo", about = "Vayo bookmarks CLI", version)]
struct Cli {
    /// Server URL (can also be set via VAYO_SERVER env var)
    #[arg(short, long, env = "VAYO_SERVER", default_value = DEFAULT_CLI_SERVER_URL)]
    server: String,

    /// User id forwarded to the server (can also be set via VAYO_USER env var)
    #[arg(short, long, env = "VAYO_USER")]
    user: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Print timing for API requests
    #[arg(long, global = true)]
    timing: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your folders
    Folders,
    /// Create a folder
    NewFolder {
        name: String,
        #[arg(short, long)]
        icon: Option<String>,
    },
    /// Make a folder publicly readable
    Share { id: String },
    /// Make a folder private again
    Unshare { id: String },
    /// Delete a folder and every bookmark in it
    DeleteFolder { id: String },
    /// List bookmarks in a folder (defaults to the last opened one)
    List {
        folder: Option<String>,
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Load every page
        #[arg(short, long, conflicts_with = "page")]
        all: bool,
    },
    /// Search loaded bookmarks by url, title or description
    Search {
        query: String,
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Add a bookmark
    Add {
        url: String,
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Rename a bookmark
    Rename { id: String, title: String },
    /// Move a bookmark to another folder
    Move { id: String, folder: String },
    /// Delete a bookmark
    Rm { id: String },
    /// Show a shared folder without signing in
    Public {
        id: String,
        #[arg(short, long)]
        all: bool,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Self::Folders => "Folders",
            Self::NewFolder { .. } => "New folder",
            Self::Share { .. } => "Share",
            Self::Unshare { .. } => "Unshare",
            Self::DeleteFolder { .. } => "Delete folder",
            Self::List { .. } => "List",
            Self::Search { .. } => "Search",
            Self::Add { .. } => "Add",
            Self::Rename { .. } => "Rename",
            Self::Move { .. } => "Move",
            Self::Rm { .. } => "Remove",
            Self::Public { .. } => "Public",
        }
    }
}

struct Output {
    json: bool,
    timing: bool,
}

impl Output {
    fn log_timing(&self, label: &str, started: Instant) {
        if self.timing {
            eprintln!(
                "[timing] {}: {:.1} ms",
                label,
                started.elapsed().as_secs_f64() * 1000.0
            );
        }
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> anyhow::Result<()> {
        let text = if self.json {
            serde_json::to_string_pretty(value)?
        } else {
            human()
        };
        if !text.is_empty() {
            println!("{}", text);
        }
        Ok(())
    }
}

fn format_folders(folders: &[FolderWithCount]) -> String {
    folders
        .iter()
        .map(|f| {
            let icon = f.folder.icon.as_deref().unwrap_or(" ");
            let shared = if f.folder.is_shared { "shared" } else { "" };
            format!(
                "{:<36} {} {:<30} {:>5} {}",
                f.folder.id, icon, f.folder.name, f.total_bookmarks, shared
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_bookmarks<'a, I>(bookmarks: I) -> String
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let now = Utc::now();
    let mut lines = Vec::new();
    for group in group_by_month(bookmarks) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(group.label);
        for b in group.bookmarks {
            lines.push(format!(
                "  {:<36} {:<13} {}  {}",
                b.id,
                format_date(b.created_at, now),
                b.title,
                b.url
            ));
        }
    }
    lines.join("\n")
}

/// Explicit folder, else the remembered one, else the oldest.
async fn resolve_folder(
    client: &ApiClient,
    prefs: &Preferences,
    folder: Option<String>,
) -> Result<String, ClientError> {
    if let Some(folder) = folder {
        return Ok(folder);
    }
    let folders = client.list_folders().await?;
    select_initial_folder(&folders, prefs)
        .map(|f| f.folder.id.clone())
        .ok_or_else(|| {
            ClientError::Validation("No folders yet; create one with new-folder".to_string())
        })
}

fn remember_folder(prefs: &mut Preferences, folder_id: &str) {
    if prefs.last_folder_id.as_deref() == Some(folder_id) {
        return;
    }
    prefs.remember_folder(folder_id);
    if let Err(err) = prefs.save(&Preferences::default_path()) {
        eprintln!("warning: failed to save preferences: {}", err);
    }
}

async fn run(client: ApiClient, command: Commands, out: &Output) -> anyhow::Result<()> {
    let mut prefs = Preferences::load(&Preferences::default_path());
    let client = Arc::new(client);
    let loader = PageLoader::new(client.clone(), Arc::new(QueryCache::new()));
    let started = Instant::now();

    match command {
        Commands::Folders => {
            let folders = client.list_folders().await?;
            out.log_timing("folders", started);
            out.emit(&folders, || format_folders(&folders))?;
        }
        Commands::NewFolder { name, icon } => {
            let folders = client.create_folder(&name, icon.as_deref()).await?;
            out.log_timing("new-folder", started);
            out.emit(&folders, || format_folders(&folders))?;
        }
        Commands::Share { id } => {
            client.set_visibility(&id, true).await?;
            out.log_timing("share", started);
            out.emit(&serde_json::json!({ "id": id, "isShared": true }), || {
                format!("Shared folder: {}", id)
            })?;
        }
        Commands::Unshare { id } => {
            client.set_visibility(&id, false).await?;
            out.log_timing("unshare", started);
            out.emit(&serde_json::json!({ "id": id, "isShared": false }), || {
                format!("Folder is private: {}", id)
            })?;
        }
        Commands::DeleteFolder { id } => {
            client.delete_folder(&id).await?;
            out.log_timing("delete-folder", started);
            out.emit(&serde_json::json!({ "id": id, "deleted": true }), || {
                format!("Deleted folder: {}", id)
            })?;
        }
        Commands::List { folder, page, all } => {
            let folder_id = resolve_folder(&client, &prefs, folder).await?;
            let rows = if all {
                let pages = loader.fetch_all(&CacheKey::owned(&folder_id)).await?;
                pages.items().cloned().collect::<Vec<_>>()
            } else {
                client
                    .list_bookmarks(Scope::Owned, &folder_id, page)
                    .await?
            };
            out.log_timing("list", started);
            remember_folder(&mut prefs, &folder_id);
            out.emit(&rows, || format_bookmarks(&rows))?;
        }
        Commands::Search { query, folder } => {
            let folder_id = resolve_folder(&client, &prefs, folder).await?;
            let pages = loader.fetch_all(&CacheKey::owned(&folder_id)).await?;
            out.log_timing("search", started);
            let hits = filter_bookmarks(pages.items(), &query);
            out.emit(&hits, || format_bookmarks(hits.iter().copied()))?;
        }
        Commands::Add { url, folder } => {
            let folder_id = resolve_folder(&client, &prefs, folder).await?;
            let created = client.create_bookmark(&url, &folder_id).await?;
            out.log_timing("add", started);
            remember_folder(&mut prefs, &folder_id);
            out.emit(&created, || format!("Added: {} ({})", created.title, created.id))?;
        }
        Commands::Rename { id, title } => {
            client.update_title(&id, &title).await?;
            out.log_timing("rename", started);
            out.emit(&serde_json::json!({ "id": id, "title": title }), || {
                format!("Renamed: {}", id)
            })?;
        }
        Commands::Move { id, folder } => {
            client.move_bookmark(&id, &folder).await?;
            out.log_timing("move", started);
            out.emit(&serde_json::json!({ "id": id, "folderId": folder }), || {
                format!("Moved {} to {}", id, folder)
            })?;
        }
        Commands::Rm { id } => {
            client.delete_bookmark(&id).await?;
            out.log_timing("rm", started);
            out.emit(&serde_json::json!({ "id": id, "deleted": true }), || {
                format!("Deleted bookmark: {}", id)
            })?;
        }
        Commands::Public { id, all } => {
            let folder = client.get_public_folder(&id).await?;
            let key = CacheKey::shared(&id);
            let pages = if all {
                loader.fetch_all(&key).await?
            } else {
                loader.fetch_next_page(&key).await?;
                loader.cache().snapshot(&key).unwrap_or_default()
            };
            out.log_timing("public", started);
            let rows: Vec<&Bookmark> = pages.items().collect();
            let body = serde_json::json!({ "folder": folder, "bookmarks": rows });
            out.emit(&body, || {
                let header = format!("{} ({} bookmarks)", folder.name, folder.total_bookmarks);
                let list = format_bookmarks(rows.iter().copied());
                if list.is_empty() {
                    header
                } else {
                    format!("{}\n\n{}", header, list)
                }
            })?;
        }
    }
    Ok(())
}

/// Warnings only, on stderr, so stdout stays parseable with `--json`.
const DEFAULT_LOG_FILTER: &str = "vayo_client=warn,vayo_core=warn";

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let Cli {
        server,
        user,
        json,
        timing,
        timeout,
        command,
    } = Cli::parse();

    let client = ApiClient::new(&server, user, Duration::from_secs(timeout))?;
    let label = command.label();
    if let Err(err) = run(client, command, &Output { json, timing }).await {
        eprintln!("{} failed: {}", label, err);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use vayo_core::models::folder::Folder;
    use vayo_core::OwnerId;

    #[test]
    fn default_log_filter_parses() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn default_server_comes_from_core_constants() {
        let _env = vayo_core::env::ScopedEnv::new().remove("VAYO_SERVER");
        let cli = Cli::try_parse_from(["vayo", "folders"]).expect("parse");
        assert_eq!(cli.server, DEFAULT_CLI_SERVER_URL);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vayo",
            "--server",
            "http://127.0.0.1:4000",
            "--user",
            "alice",
            "list",
            "folder-1",
            "--all",
            "--json",
        ])
        .expect("parse");
        assert_eq!(cli.server, "http://127.0.0.1:4000");
        assert_eq!(cli.user.as_deref(), Some("alice"));
        assert!(cli.json);
        match cli.command {
            Commands::List { folder, all, page } => {
                assert_eq!(folder.as_deref(), Some("folder-1"));
                assert!(all);
                assert_eq!(page, 1);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn all_and_page_conflict() {
        assert!(Cli::try_parse_from(["vayo", "list", "--all", "--page", "2"]).is_err());
    }

    #[test]
    fn folder_rows_show_counts_and_sharing() {
        let owner = OwnerId::new("alice");
        let mut shared = Folder::new(&owner, "Reading".to_string(), Some("📚".to_string()));
        shared.is_shared = true;
        let private = Folder::new(&owner, "Inbox".to_string(), None);
        let output = format_folders(&[shared.clone().with_count(3), private.with_count(0)]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(&shared.id));
        assert!(lines[0].contains("Reading"));
        assert!(lines[0].ends_with("3 shared"));
        assert!(lines[1].ends_with('0'));
    }

    #[test]
    fn bookmark_listing_groups_by_month() {
        let url = vayo_core::url::normalize_bookmark_url("docs.rs").expect("url");
        let mut newer = Bookmark::new(
            "f".to_string(),
            &url,
            vayo_core::PageMetadata::default(),
        );
        newer.created_at = Utc
            .with_ymd_and_hms(2024, 3, 6, 9, 0, 0)
            .single()
            .expect("date");
        let mut older = newer.clone();
        older.id = "older".to_string();
        older.created_at = newer.created_at - ChronoDuration::days(40);

        let output = format_bookmarks(&[newer, older]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "March 2024");
        assert!(lines[1].contains("Mar 6, 2024"));
        assert!(lines[1].contains("Docs"));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "January 2024");
        assert!(format_bookmarks(std::iter::empty()).is_empty());
    }
}
