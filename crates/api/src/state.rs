use std::sync::Arc;

use crate::config::ServerConfig;
use crate::media::MediaResolver;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: meridian_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Question image URL resolver (public probe + signed fallback).
    pub media: Arc<MediaResolver>,
}
