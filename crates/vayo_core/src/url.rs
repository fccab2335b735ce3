//! URL validation, normalization and placeholder derivation.
//!
//! The same rules run in the client before submission and in the service
//! before persistence, so both accept exactly the same inputs.

use crate::constants::UNTITLED;
use crate::error::AppError;
pub use reqwest::Url;

/// A validated bookmark URL.
///
/// Keeps the normalized text exactly as it will be persisted alongside the
/// parsed form used for fetching and placeholder derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkUrl {
    text: String,
    parsed: Url,
}

impl BookmarkUrl {
    /// Normalized text, e.g. `https://example.com`.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Parsed URL.
    pub fn parsed(&self) -> &Url {
        &self.parsed
    }
}

fn has_http_scheme(input: &str) -> bool {
    let lower = input.get(..8).unwrap_or(input).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Prefix `https://` unless the input already starts with `http://` or `https://`.
pub fn add_scheme_if_missing(input: &str) -> String {
    if has_http_scheme(input) {
        input.to_string()
    } else {
        format!("https://{}", input)
    }
}

fn is_valid_host(host: &str) -> bool {
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return false;
    }
    labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false)
}

/// Check whether `input` looks like a bookmarkable URL.
///
/// Accepts protocol-qualified `http(s)://host.tld/...` and bare
/// `host.tld/...` forms. Other schemes, hosts without a dotted alphabetic
/// TLD, ports, userinfo and embedded whitespace are rejected.
pub fn is_valid_bookmark_url(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return false;
    }
    let without_scheme = match trimmed.find("://") {
        Some(index) => {
            if !has_http_scheme(trimmed) {
                return false;
            }
            &trimmed[index + 3..]
        }
        None => trimmed,
    };
    let host = match without_scheme.find('/') {
        Some(index) => &without_scheme[..index],
        None => without_scheme,
    };
    is_valid_host(host)
}

/// Validate and normalize raw user input into a [`BookmarkUrl`].
///
/// # Errors
/// Returns [`AppError::BadRequest`] when the input is not a bookmarkable URL.
pub fn normalize_bookmark_url(input: &str) -> Result<BookmarkUrl, AppError> {
    let trimmed = input.trim();
    if !is_valid_bookmark_url(trimmed) {
        return Err(AppError::BadRequest(format!("Invalid URL: '{}'", trimmed)));
    }
    let text = add_scheme_if_missing(trimmed);
    let parsed = Url::parse(&text)
        .map_err(|err| AppError::BadRequest(format!("Invalid URL '{}': {}", trimmed, err)))?;
    Ok(BookmarkUrl { text, parsed })
}

/// Short website name: the first hostname label after dropping `www.`.
pub fn website_name(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title shown before any metadata is known: `github.com` becomes `Github`.
pub fn placeholder_title(url: &Url) -> String {
    website_name(url)
        .map(|name| capitalize_first(&name))
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Conventional favicon location for the URL's origin.
pub fn favicon_guess(url: &Url) -> Option<String> {
    url.host_str()?;
    url.join("/favicon.ico").ok().map(|favicon| favicon.to_string())
}

/// Resolve a possibly-relative reference against `base`, keeping only
/// http(s) results.
pub fn resolve_http_reference(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    let resolved = base.join(reference).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https_prefix() {
        let url = normalize_bookmark_url("example.com").expect("valid");
        assert_eq!(url.as_str(), "https://example.com");
    }

    #[test]
    fn explicit_schemes_are_preserved() {
        let http = normalize_bookmark_url("http://news.ycombinator.com/item?id=1").expect("http");
        assert_eq!(http.as_str(), "http://news.ycombinator.com/item?id=1");
        let mixed = normalize_bookmark_url("  HTTPS://Example.org/a ").expect("mixed case");
        assert_eq!(mixed.as_str(), "HTTPS://Example.org/a");
    }

    #[test]
    fn rejects_inputs_the_url_pattern_refuses() {
        for input in [
            "",
            "   ",
            "not a url",
            "localhost",
            "example",
            "example.c",
            "example.123",
            "ftp://files.example.com",
            "javascript://alert(1).com",
            "exa mple.com",
            "a..com",
            "user@example.com",
            "example.com:8080/path",
        ] {
            assert!(!is_valid_bookmark_url(input), "should reject {:?}", input);
            assert!(matches!(
                normalize_bookmark_url(input),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn accepts_paths_and_subdomains() {
        for input in [
            "docs.rs/redb/latest",
            "https://sub.domain.example.co.uk/",
            "my-site.dev",
        ] {
            assert!(is_valid_bookmark_url(input), "should accept {:?}", input);
        }
    }

    #[test]
    fn placeholder_title_uses_first_host_label() {
        let url = Url::parse("https://www.github.com/rust-lang").expect("url");
        assert_eq!(placeholder_title(&url), "Github");
        let url = Url::parse("https://docs.rs/").expect("url");
        assert_eq!(placeholder_title(&url), "Docs");
    }

    #[test]
    fn placeholder_title_falls_back_to_untitled_without_host() {
        let url = Url::parse("data:text/plain,hello").expect("url");
        assert_eq!(placeholder_title(&url), UNTITLED);
        assert!(favicon_guess(&url).is_none());
    }

    #[test]
    fn favicon_guess_points_at_origin_root() {
        let url = Url::parse("https://example.com/deep/page?q=1").expect("url");
        assert_eq!(
            favicon_guess(&url).as_deref(),
            Some("https://example.com/favicon.ico")
        );
    }

    #[test]
    fn resolve_http_reference_rejects_non_http_targets() {
        let base = Url::parse("https://example.com/blog/post").expect("url");
        assert_eq!(
            resolve_http_reference(&base, "/icon.png").as_deref(),
            Some("https://example.com/icon.png")
        );
        assert_eq!(
            resolve_http_reference(&base, "img/a.png").as_deref(),
            Some("https://example.com/blog/img/a.png")
        );
        assert!(resolve_http_reference(&base, "data:image/png;base64,AAAA").is_none());
        assert!(resolve_http_reference(&base, "  ").is_none());
    }
}
