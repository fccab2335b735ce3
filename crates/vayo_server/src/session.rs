//! Caller identity extraction.
//!
//! Authentication happens upstream; the proxy in front of this service puts
//! the verified user id in the header named by `AUTH_HEADER`.

use crate::{error::HttpError, AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use hyper::HeaderMap;
use vayo_core::{AppError, OwnerId};

/// Authenticated caller. Rejects with 401 when the header is missing or blank.
#[derive(Debug, Clone)]
pub struct Session(pub OwnerId);

/// Owner id carried in `header`, trimmed. `None` when absent, blank or not
/// visible ASCII.
pub fn owner_from_headers(headers: &HeaderMap, header: &str) -> Option<OwnerId> {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(OwnerId::new)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        owner_from_headers(&parts.headers, state.config.auth_header.as_str())
            .map(Session)
            .ok_or(HttpError(AppError::Unauthorized))
    }
}

#[cfg(test)]
mod tests {
    use super::owner_from_headers;
    use hyper::header::HeaderValue;
    use hyper::HeaderMap;

    #[test]
    fn reads_and_trims_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-user", HeaderValue::from_static("  alice "));
        let owner = owner_from_headers(&headers, "x-forwarded-user").expect("owner");
        assert_eq!(owner.as_str(), "alice");
        assert!(owner_from_headers(&headers, "x-vayo-user").is_none());
    }

    #[test]
    fn blank_or_opaque_values_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("x-vayo-user", HeaderValue::from_static("   "));
        assert!(owner_from_headers(&headers, "x-vayo-user").is_none());

        let opaque = HeaderValue::from_bytes(&[0xfa, 0xfb]).expect("bytes");
        headers.insert("x-vayo-user", opaque);
        assert!(owner_from_headers(&headers, "x-vayo-user").is_none());
    }
}
