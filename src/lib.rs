//! Root crate facade for the Vayo bookmark service and client.

pub use vayo_client as client;
pub use vayo_core::{
    bookmark_ops, config, db, enrichment, error, folder_ops, metadata, models, pagination, url,
    AppError, Config, Database, EnrichmentQueue, MetadataFetcher, OwnerId, PageMetadata,
};
pub use vayo_server::{create_app, handlers, resolve_bind_address, serve_router, AppState};
