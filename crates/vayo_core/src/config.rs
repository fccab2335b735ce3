//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_AUTH_HEADER, DEFAULT_ENRICHMENT_CONCURRENCY, DEFAULT_ENRICHMENT_QUEUE_CAPACITY,
    DEFAULT_MAX_BODY_SIZE, DEFAULT_METADATA_MAX_REDIRECTS, DEFAULT_METADATA_TIMEOUT_MS,
    DEFAULT_PORT,
};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for the Vayo server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    /// Listener override (`BIND`); applied by the server's bind policy.
    pub bind: Option<String>,
    /// Permit non-loopback binds and any CORS origin.
    pub allow_public_access: bool,
    pub max_body_size: usize,
    pub auth_header: String,
    pub cors_origin: Option<String>,
    pub metadata_timeout_ms: u64,
    pub metadata_max_redirects: usize,
    pub metadata_fetch_enabled: bool,
    pub enrichment_concurrency: usize,
    pub enrichment_queue_capacity: usize,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

/// Home directory from `HOME`/`USERPROFILE`, else the working directory.
pub fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment, falling back to `default`
/// when the variable is missing or unrecognized.
pub fn env_flag_or(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(default)
}

fn env_parse_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}='{}'", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("DB_PATH").map(expand_tilde).unwrap_or_else(|_| {
                let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
                let cache_dir = home.join(".cache").join("vayo");
                cache_dir.join("db").to_string_lossy().to_string()
            }),
            port: env_parse_or("PORT", DEFAULT_PORT),
            bind: non_empty_env("BIND"),
            allow_public_access: env_flag_or("ALLOW_PUBLIC_ACCESS", false),
            max_body_size: env_parse_or("MAX_BODY_SIZE", DEFAULT_MAX_BODY_SIZE),
            auth_header: non_empty_env("AUTH_HEADER")
                .map(|value| value.to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string()),
            cors_origin: non_empty_env("CORS_ORIGIN"),
            metadata_timeout_ms: env_parse_or("METADATA_TIMEOUT_MS", DEFAULT_METADATA_TIMEOUT_MS),
            metadata_max_redirects: env_parse_or(
                "METADATA_MAX_REDIRECTS",
                DEFAULT_METADATA_MAX_REDIRECTS,
            ),
            metadata_fetch_enabled: env_flag_or("METADATA_FETCH", true),
            enrichment_concurrency: env_parse_or(
                "ENRICHMENT_CONCURRENCY",
                DEFAULT_ENRICHMENT_CONCURRENCY,
            )
            .max(1),
            enrichment_queue_capacity: env_parse_or(
                "ENRICHMENT_QUEUE_CAPACITY",
                DEFAULT_ENRICHMENT_QUEUE_CAPACITY,
            )
            .max(1),
        }
    }

    /// Configuration suitable for tests: the given database path, port 0 and
    /// network scraping disabled.
    pub fn for_db_path(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            port: 0,
            bind: None,
            allow_public_access: false,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            cors_origin: None,
            metadata_timeout_ms: DEFAULT_METADATA_TIMEOUT_MS,
            metadata_max_redirects: DEFAULT_METADATA_MAX_REDIRECTS,
            metadata_fetch_enabled: false,
            enrichment_concurrency: 1,
            enrichment_queue_capacity: DEFAULT_ENRICHMENT_QUEUE_CAPACITY,
        }
    }

    /// Metadata fetch timeout as a [`Duration`].
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_env_flag, Config};
    use crate::env::ScopedEnv;

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_accepts_falsy_values() {
        for value in ["", "0", "false", "FALSE", " no ", "off"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag("enabled"), None);
    }

    #[test]
    fn from_env_applies_metadata_overrides() {
        let _env = ScopedEnv::new()
            .set("METADATA_TIMEOUT_MS", "2500")
            .set("METADATA_MAX_REDIRECTS", "3")
            .set("METADATA_FETCH", "off")
            .set("AUTH_HEADER", "X-Forwarded-User")
            .set("BIND", " 0.0.0.0:4040 ")
            .set("ALLOW_PUBLIC_ACCESS", "yes");

        let config = Config::from_env();
        assert_eq!(config.metadata_timeout_ms, 2500);
        assert_eq!(config.metadata_max_redirects, 3);
        assert!(!config.metadata_fetch_enabled);
        assert_eq!(config.auth_header, "x-forwarded-user");
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:4040"));
        assert!(config.allow_public_access);
    }

    #[test]
    fn from_env_falls_back_on_garbage_values() {
        let _env = ScopedEnv::new()
            .set("PORT", "not-a-port")
            .set("ENRICHMENT_CONCURRENCY", "0")
            .set("ENRICHMENT_QUEUE_CAPACITY", "0")
            .remove("CORS_ORIGIN")
            .set("BIND", "   ")
            .set("ALLOW_PUBLIC_ACCESS", "maybe");

        let config = Config::from_env();
        assert_eq!(config.port, crate::DEFAULT_PORT);
        assert_eq!(config.enrichment_concurrency, 1);
        assert_eq!(config.enrichment_queue_capacity, 1);
        assert!(config.cors_origin.is_none());
        assert!(config.bind.is_none());
        assert!(!config.allow_public_access);
    }
}
