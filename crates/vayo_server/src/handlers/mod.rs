//! HTTP request handlers.

/// Owner-scoped bookmark endpoints.
pub mod bookmark;
/// Owner-scoped folder endpoints.
pub mod folder;
/// Unauthenticated read-only endpoints for shared folders.
pub mod public;
