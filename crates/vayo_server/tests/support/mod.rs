//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vayo_core::metadata::{FetchError, FetchFuture, MetadataFetcher, PageMetadata};
use vayo_core::url::Url;
use vayo_core::EnrichmentQueue;
use vayo_server::{create_app, AppState, Config, Database};

pub(crate) const USER_HEADER: &str = "x-vayo-user";
pub(crate) const TITLED_HOST: &str = "titled.example.com";

/// Answers with a title for [`TITLED_HOST`] and times out for everything else.
pub(crate) struct StubFetcher;

impl MetadataFetcher for StubFetcher {
    fn fetch_metadata<'a>(&'a self, url: &'a Url) -> FetchFuture<'a> {
        let result = if url.host_str() == Some(TITLED_HOST) {
            Ok(PageMetadata {
                title: Some("Titled Page".to_string()),
                description: Some("A page with metadata".to_string()),
                ..PageMetadata::default()
            })
        } else {
            Err(FetchError::Timeout)
        };
        Box::pin(async move { result })
    }

    fn scrape_page<'a>(&'a self, url: &'a Url) -> FetchFuture<'a> {
        self.fetch_metadata(url)
    }
}

pub(crate) fn test_config_for_db_path(db_path: &Path) -> Config {
    Config::for_db_path(db_path.to_str().expect("db path"))
}

pub(crate) fn test_server_for_config(config: Config) -> TestServer {
    let db = Database::new(config.db_path.as_str()).expect("open db");
    let state = AppState::new(
        config,
        Arc::new(db),
        Arc::new(StubFetcher),
        EnrichmentQueue::disabled(),
    );
    TestServer::new(create_app(state, false)).expect("server")
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("test.db");
    let server = test_server_for_config(test_config_for_db_path(&db_path));
    (server, temp_dir)
}
