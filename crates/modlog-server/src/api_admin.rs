//! Administrative handlers for per-community log settings.
//!
//! All routes here sit behind [`crate::middleware::admin_auth_middleware`].

use crate::{api::ApiError, AppState};
use axum::extract::{Extension, Json, Path};
use modlog_settings::{
    clear_type_overrides, guild_settings, set_global_destination, set_type_override, toggle,
    GuildSettings, SettingsError,
};
use modlog_types::EventType;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for destination updates.
#[derive(Debug, Deserialize)]
pub struct SetChannelRequest {
    #[serde(rename = "channelId")]
    pub channel_id: String,
}

/// Response body for settings writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminResponse {
    pub message: String,
}

/// Response body for `POST /api/guilds/{guildId}/toggles/{type}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub enabled: bool,
    pub message: String,
}

fn parse_type(raw: &str) -> Result<EventType, ApiError> {
    raw.parse()
        .map_err(|e: modlog_types::ParseEventTypeError| ApiError::BadRequest(e.to_string()))
}

fn require_channel(body: &SetChannelRequest) -> Result<String, ApiError> {
    let channel = body.channel_id.trim();
    if channel.is_empty() {
        return Err(ApiError::BadRequest("channelId must not be empty".to_string()));
    }
    Ok(channel.to_string())
}

/// Runs a settings operation on a pooled connection off the async runtime.
async fn with_conn<T, F>(state: &Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, SettingsError> + Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        op(&*conn).map_err(|e| {
            tracing::error!(error = %e, "settings write failed");
            ApiError::InternalServerError(e.to_string())
        })
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}

/// Handler for `PUT /api/guilds/{guildId}/log-channel`.
pub async fn set_log_channel_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(guild_id): Path<String>,
    Json(body): Json<SetChannelRequest>,
) -> Result<Json<AdminResponse>, ApiError> {
    let channel = require_channel(&body)?;
    let (g, c) = (guild_id.clone(), channel.clone());
    with_conn(&state, move |conn| set_global_destination(conn, &g, &c)).await?;

    tracing::info!(guild_id = %guild_id, destination = %channel, "global log channel set");
    Ok(Json(AdminResponse {
        message: format!("Global log channel set to <#{channel}>"),
    }))
}

/// Handler for `PUT /api/guilds/{guildId}/log-channel/{type}`.
pub async fn set_type_channel_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((guild_id, raw_type)): Path<(String, String)>,
    Json(body): Json<SetChannelRequest>,
) -> Result<Json<AdminResponse>, ApiError> {
    let event_type = parse_type(&raw_type)?;
    let channel = require_channel(&body)?;
    let (g, c) = (guild_id.clone(), channel.clone());
    with_conn(&state, move |conn| set_type_override(conn, &g, event_type, &c)).await?;

    tracing::info!(
        guild_id = %guild_id,
        event_type = %event_type,
        destination = %channel,
        "log type override set"
    );
    Ok(Json(AdminResponse {
        message: format!("Specific log for **{event_type}** set to <#{channel}>"),
    }))
}

/// Handler for `POST /api/guilds/{guildId}/toggles/{type}`.
pub async fn toggle_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((guild_id, raw_type)): Path<(String, String)>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let event_type = parse_type(&raw_type)?;
    let g = guild_id.clone();
    let enabled = with_conn(&state, move |conn| toggle(conn, &g, event_type)).await?;

    tracing::info!(guild_id = %guild_id, event_type = %event_type, enabled, "log type toggled");
    let label = if enabled { "ENABLED" } else { "DISABLED" };
    Ok(Json(ToggleResponse {
        event_type,
        enabled,
        message: format!("Log type **{event_type}** is now **{label}**"),
    }))
}

/// Handler for `DELETE /api/guilds/{guildId}/log-channels`.
pub async fn reset_type_channels_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(guild_id): Path<String>,
) -> Result<Json<AdminResponse>, ApiError> {
    let g = guild_id.clone();
    let removed = with_conn(&state, move |conn| clear_type_overrides(conn, &g)).await?;

    tracing::info!(guild_id = %guild_id, removed, "log type overrides cleared");
    Ok(Json(AdminResponse {
        message: "All specific log channels have been reset to the global log channel."
            .to_string(),
    }))
}

/// Handler for `GET /api/guilds/{guildId}/settings`.
pub async fn get_settings_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(guild_id): Path<String>,
) -> Result<Json<GuildSettings>, ApiError> {
    let summary = with_conn(&state, move |conn| guild_settings(conn, &guild_id)).await?;
    Ok(Json(summary))
}
