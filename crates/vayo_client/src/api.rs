//! HTTP client for the Vayo API.

use crate::cache::Scope;
use crate::error::ClientError;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use vayo_core::constants::DEFAULT_AUTH_HEADER;
use vayo_core::models::bookmark::Bookmark;
use vayo_core::models::folder::{FolderWithCount, PublicFolder};

/// Bookmark endpoints the optimistic layer drives.
///
/// Implemented by [`ApiClient`]; tests substitute an in-memory fake.
pub trait BookmarkApi: Send + Sync {
    /// One page (1-based) of a folder's bookmarks, newest first.
    fn list_bookmarks(
        &self,
        scope: Scope,
        folder_id: &str,
        page: u32,
    ) -> impl Future<Output = Result<Vec<Bookmark>, ClientError>> + Send;

    fn create_bookmark(
        &self,
        url: &str,
        folder_id: &str,
    ) -> impl Future<Output = Result<Bookmark, ClientError>> + Send;

    fn update_title(
        &self,
        bookmark_id: &str,
        title: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn move_bookmark(
        &self,
        bookmark_id: &str,
        folder_id: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn delete_bookmark(
        &self,
        bookmark_id: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// reqwest-backed API client.
///
/// The authenticated user id is forwarded in the configured auth header, the
/// way the upstream auth provider would.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
    user: Option<String>,
    auth_header: String,
}

impl ApiClient {
    /// Build a client for `server` (e.g. `http://localhost:3000`).
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidUrl`] for an unusable server URL and
    /// [`ClientError::Http`] when the HTTP client cannot be built.
    pub fn new(server: &str, user: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(server.trim())
            .map_err(|err| ClientError::InvalidUrl(format!("{}: {}", server, err)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{}: cannot be used as an API base",
                server
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            user: user
                .map(|user| user.trim().to_string())
                .filter(|user| !user.is_empty()),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        })
    }

    /// Use a non-default header name for the user id.
    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        let mut path = url.path_segments_mut().map_err(|_| {
            ClientError::InvalidUrl(format!("{}: cannot be used as an API base", self.base))
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
        drop(path);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(segments)?;
        let builder = self.client.request(method, url);
        Ok(match self.user.as_deref() {
            Some(user) => builder.header(self.auth_header.as_str(), user),
            None => builder,
        })
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ClientError> {
        let res = builder.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => format!("failed to read error response body: {}", err),
        };
        Err(ClientError::from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        Ok(Self::send(builder).await?.json().await?)
    }

    /// Folders owned by the current user, oldest first.
    pub async fn list_folders(&self) -> Result<Vec<FolderWithCount>, ClientError> {
        Self::send_json(self.request(Method::GET, &["api", "folders"])?).await
    }

    /// Create a folder and return the refreshed folder list.
    pub async fn create_folder(
        &self,
        name: &str,
        icon: Option<&str>,
    ) -> Result<Vec<FolderWithCount>, ClientError> {
        let body = json!({ "name": name, "icon": icon });
        Self::send_json(self.request(Method::POST, &["api", "folders"])?.json(&body)).await
    }

    /// The caller's folder, or `None` when missing or not theirs.
    pub async fn get_folder(&self, id: &str) -> Result<Option<FolderWithCount>, ClientError> {
        Self::send_json(self.request(Method::GET, &["api", "folders", id])?).await
    }

    pub async fn set_visibility(&self, id: &str, is_shared: bool) -> Result<(), ClientError> {
        let body = json!({ "isShared": is_shared });
        Self::send(
            self.request(Method::PUT, &["api", "folders", id, "visibility"])?
                .json(&body),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_folder(&self, id: &str) -> Result<(), ClientError> {
        Self::send(self.request(Method::DELETE, &["api", "folders", id])?).await?;
        Ok(())
    }

    /// Read-only view of a shared folder. Needs no user.
    pub async fn get_public_folder(&self, id: &str) -> Result<PublicFolder, ClientError> {
        Self::send_json(self.request(Method::GET, &["api", "public", "folders", id])?).await
    }
}

impl BookmarkApi for ApiClient {
    async fn list_bookmarks(
        &self,
        scope: Scope,
        folder_id: &str,
        page: u32,
    ) -> Result<Vec<Bookmark>, ClientError> {
        let builder = match scope {
            Scope::Owned => self.request(Method::GET, &["api", "folders", folder_id, "bookmarks"])?,
            Scope::Shared => self.request(
                Method::GET,
                &["api", "public", "folders", folder_id, "bookmarks"],
            )?,
        };
        Self::send_json(builder.query(&[("page", page)])).await
    }

    async fn create_bookmark(&self, url: &str, folder_id: &str) -> Result<Bookmark, ClientError> {
        let body = json!({ "url": url, "folderId": folder_id });
        Self::send_json(self.request(Method::POST, &["api", "bookmarks"])?.json(&body)).await
    }

    async fn update_title(&self, bookmark_id: &str, title: &str) -> Result<(), ClientError> {
        let body = json!({ "title": title });
        Self::send(
            self.request(Method::PUT, &["api", "bookmarks", bookmark_id, "title"])?
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn move_bookmark(&self, bookmark_id: &str, folder_id: &str) -> Result<(), ClientError> {
        let body = json!({ "folderId": folder_id });
        Self::send(
            self.request(Method::PUT, &["api", "bookmarks", bookmark_id, "folder"])?
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_bookmark(&self, bookmark_id: &str) -> Result<(), ClientError> {
        Self::send(self.request(Method::DELETE, &["api", "bookmarks", bookmark_id])?).await?;
        Ok(())
    }
}
