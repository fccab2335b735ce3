//! Headless API server entrypoint.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vayo::{
    config::Config,
    db::Database,
    enrichment::spawn_enrichment_worker,
    metadata::fetcher_from_config,
    resolve_bind_address, serve_router, AppState,
};
use vayo_core::DEFAULT_PORT;

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vayo=info,vayo_server=info,vayo_core=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if parse_cli_flags(&args)?.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let database = Arc::new(Database::new(&config.db_path)?);
    tracing::info!(db_path = %config.db_path, "Database opened");

    let fetcher = fetcher_from_config(&config)?;
    let (enrichment, worker) = spawn_enrichment_worker(
        database.clone(),
        fetcher.clone(),
        config.enrichment_concurrency,
        config.enrichment_queue_capacity,
    );
    let state = AppState::new(config.clone(), database, fetcher, enrichment);

    let allow_public = config.allow_public_access;
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_addr = resolve_bind_address(&config);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("Vayo running at http://{}", actual_addr);

    let serve_result = serve_router(listener, state, allow_public, shutdown_signal()).await;

    // The router held the last queue senders; the worker exits once in-flight jobs finish.
    match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => tracing::info!("Enrichment worker drained"),
        Ok(Err(err)) => tracing::error!("Enrichment worker failed: {}", err),
        Err(_) => tracing::warn!("Enrichment worker still busy at shutdown; abandoning jobs"),
    }

    serve_result?;
    Ok(())
}

fn print_help() {
    println!("Vayo Server\n");
    println!("Usage: vayo-server [OPTIONS]\n");
    println!("Options:");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DB_PATH           Database directory (default: ~/.cache/vayo/db)");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!("  BIND              Override bind address (e.g. 0.0.0.0:{})", DEFAULT_PORT);
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin and non-loopback binds");
    println!("  AUTH_HEADER       Header carrying the authenticated user id");
    println!("                    (default: x-vayo-user)");
    println!("  CORS_ORIGIN       Extra browser origin allowed by CORS");
    println!("  MAX_BODY_SIZE     Maximum request body size in bytes (default: 64KB)");
    println!("  METADATA_FETCH    Fetch page metadata for new bookmarks (default: true)");
    println!("  METADATA_TIMEOUT_MS       Metadata fetch timeout (default: 10000)");
    println!("  METADATA_MAX_REDIRECTS    Redirects followed per fetch (default: 10)");
    println!("  ENRICHMENT_CONCURRENCY    Parallel background scrapes (default: 4)");
    println!("  ENRICHMENT_QUEUE_CAPACITY Pending background scrapes kept (default: 1024)");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down gracefully...");
}
