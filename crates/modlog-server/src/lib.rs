//! Modlog server library logic.
//!
//! Hosts the administrative settings surface and the HTTP event ingest that
//! feeds the pipeline.

pub mod api;
pub mod api_admin;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use modlog_db::DbPool;
use modlog_pipeline::RawEvent;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Bearer token for the administrative routes.
    pub admin_token: String,
    /// Ingest side of the pipeline's event source.
    pub events: mpsc::Sender<RawEvent>,
}

/// Maximum request body size (256 KiB).
const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/api/guilds/{guildId}/log-channel",
            put(api_admin::set_log_channel_handler),
        )
        .route(
            "/api/guilds/{guildId}/log-channel/{type}",
            put(api_admin::set_type_channel_handler),
        )
        .route(
            "/api/guilds/{guildId}/toggles/{type}",
            post(api_admin::toggle_handler),
        )
        .route(
            "/api/guilds/{guildId}/log-channels",
            delete(api_admin::reset_type_channels_handler),
        )
        .route(
            "/api/guilds/{guildId}/settings",
            get(api_admin::get_settings_handler),
        )
        .route("/api/events", post(api::ingest_event_handler))
        .layer(axum::middleware::from_fn(middleware::admin_auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
