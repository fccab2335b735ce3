//! HTTP server wiring for Vayo (API, handlers, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for folder, bookmark and public endpoints.
pub mod handlers;
/// Caller identity extraction.
pub mod session;

pub use vayo_core::{config, db, models, AppError, Config, Database, DEFAULT_PORT};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use vayo_core::{EnrichmentQueue, MetadataFetcher};

const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; frame-ancestors 'none'; base-uri 'none'";

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn MetadataFetcher>,
    pub enrichment: EnrichmentQueue,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `db`: Open database handle, shared with the enrichment worker.
    /// - `fetcher`: Metadata source used while creating bookmarks.
    /// - `enrichment`: Queue feeding the detached enrichment worker.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn new(
        config: Config,
        db: Arc<Database>,
        fetcher: Arc<dyn MetadataFetcher>,
        enrichment: EnrichmentQueue,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            fetcher,
            enrichment,
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Pick the listener address from `config.bind` under the loopback policy.
///
/// An unparseable override falls back to `127.0.0.1:port`. A non-loopback
/// address is only honoured when `config.allow_public_access` is set;
/// otherwise its port is kept and the host forced to `127.0.0.1`.
pub fn resolve_bind_address(config: &Config) -> SocketAddr {
    let loopback = |port| SocketAddr::from(([127, 0, 0, 1], port));
    let requested = match config.bind.as_deref() {
        None => loopback(config.port),
        Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|err| {
            tracing::warn!(bind = raw, error = %err, "Ignoring invalid BIND");
            loopback(config.port)
        }),
    };

    if config.allow_public_access || requested.ip().is_loopback() {
        return requested;
    }
    tracing::warn!(
        requested = %requested,
        "Non-loopback BIND needs ALLOW_PUBLIC_ACCESS; using 127.0.0.1"
    );
    loopback(requested.port())
}

fn cors_layer(config: &Config, allow_public_access: bool, cors_port: u16) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    if allow_public_access {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any);
    }

    let mut origins: Vec<HeaderValue> = [
        format!("http://localhost:{}", cors_port),
        format!("http://127.0.0.1:{}", cors_port),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();
    if let Some(extra) = config.cors_origin.as_deref() {
        match HeaderValue::from_str(extra) {
            Ok(value) => origins.push(value),
            Err(err) => tracing::warn!("Ignoring invalid CORS_ORIGIN='{}': {}", extra, err),
        }
    }

    let mut headers = vec![header::CONTENT_TYPE, header::ACCEPT];
    match HeaderName::from_bytes(config.auth_header.as_bytes()) {
        Ok(name) => headers.push(name),
        Err(err) => tracing::warn!("Invalid AUTH_HEADER='{}': {}", config.auth_header, err),
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let cors = cors_layer(&state.config, allow_public_access, cors_port);
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/", get(handlers::public::health))
        .route(
            "/api/folders",
            get(handlers::folder::list_folders).post(handlers::folder::create_folder),
        )
        .route(
            "/api/folders/:id",
            get(handlers::folder::get_folder).delete(handlers::folder::delete_folder),
        )
        .route(
            "/api/folders/:id/visibility",
            put(handlers::folder::update_visibility),
        )
        .route(
            "/api/folders/:id/bookmarks",
            get(handlers::folder::list_bookmarks),
        )
        .route("/api/bookmarks", post(handlers::bookmark::create_bookmark))
        .route(
            "/api/bookmarks/:id",
            delete(handlers::bookmark::delete_bookmark),
        )
        .route(
            "/api/bookmarks/:id/title",
            put(handlers::bookmark::update_title),
        )
        .route(
            "/api/bookmarks/:id/folder",
            put(handlers::bookmark::move_bookmark),
        )
        .route(
            "/api/public/folders/:id",
            get(handlers::public::get_public_folder),
        )
        .route(
            "/api/public/folders/:id/bookmarks",
            get(handlers::public::list_public_bookmarks),
        )
        .route(
            "/api/getFolderById",
            get(handlers::public::folder_preview),
        )
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_body_size))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::listener_cors_port;
    use super::resolve_bind_address;
    use std::net::SocketAddr;
    use vayo_core::{Config, DEFAULT_PORT};

    #[tokio::test]
    async fn listener_cors_port_uses_bound_listener_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener");
        let expected = listener.local_addr().expect("listener addr").port();
        let resolved = listener_cors_port(&listener, DEFAULT_PORT);
        assert_eq!(resolved, expected);
    }

    #[test]
    fn bind_policy_forces_loopback_without_public_access() {
        let mut config = Config::for_db_path("/tmp/vayo-db");
        config.port = 4040;
        config.bind = Some("0.0.0.0:4040".to_string());
        assert_eq!(
            resolve_bind_address(&config),
            SocketAddr::from(([127, 0, 0, 1], 4040))
        );

        config.allow_public_access = true;
        assert_eq!(
            resolve_bind_address(&config),
            SocketAddr::from(([0, 0, 0, 0], 4040))
        );
    }

    #[test]
    fn bind_policy_defaults_and_falls_back_to_loopback_port() {
        let mut config = Config::for_db_path("/tmp/vayo-db");
        config.port = 4041;
        assert_eq!(
            resolve_bind_address(&config),
            SocketAddr::from(([127, 0, 0, 1], 4041))
        );

        config.bind = Some("bad:host".to_string());
        assert_eq!(
            resolve_bind_address(&config),
            SocketAddr::from(([127, 0, 0, 1], 4041))
        );

        config.bind = Some("127.0.0.2:5050".to_string());
        assert_eq!(
            resolve_bind_address(&config),
            SocketAddr::from(([127, 0, 0, 2], 5050))
        );
    }
}
