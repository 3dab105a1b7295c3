//! Persistence operations for per-community settings.
//!
//! Every write is a single upsert or delete statement, so no partially
//! written state is ever observable. [`toggle`] in particular negates the
//! stored flag in place instead of reading it first; two concurrent toggles
//! on the same key therefore always return the flag to where it started.

use std::collections::BTreeMap;

use modlog_types::EventType;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::SettingsError;

/// Sets (or replaces) the community-wide log destination.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn set_global_destination(
    conn: &Connection,
    guild_id: &str,
    channel_id: &str,
) -> Result<(), SettingsError> {
    conn.execute(
        "INSERT INTO guilds (guild_id, global_log_channel) VALUES (?1, ?2)
         ON CONFLICT(guild_id) DO UPDATE SET
            global_log_channel = excluded.global_log_channel,
            updated_at = datetime('now')",
        params![guild_id, channel_id],
    )?;
    Ok(())
}

/// Returns the community-wide log destination, if one is set.
///
/// An empty stored identifier is treated as unset.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn global_destination(
    conn: &Connection,
    guild_id: &str,
) -> Result<Option<String>, SettingsError> {
    let channel: Option<Option<String>> = conn
        .query_row(
            "SELECT global_log_channel FROM guilds WHERE guild_id = ?1",
            params![guild_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(channel.flatten().filter(|c| !c.is_empty()))
}

/// Sets (or replaces) the destination for one event type.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn set_type_override(
    conn: &Connection,
    guild_id: &str,
    event_type: EventType,
    channel_id: &str,
) -> Result<(), SettingsError> {
    conn.execute(
        "INSERT INTO type_overrides (guild_id, event_type, channel_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(guild_id, event_type) DO UPDATE SET
            channel_id = excluded.channel_id,
            updated_at = datetime('now')",
        params![guild_id, event_type.as_str(), channel_id],
    )?;
    Ok(())
}

/// Returns the destination override for one event type, if any.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn type_override(
    conn: &Connection,
    guild_id: &str,
    event_type: EventType,
) -> Result<Option<String>, SettingsError> {
    let channel: Option<String> = conn
        .query_row(
            "SELECT channel_id FROM type_overrides WHERE guild_id = ?1 AND event_type = ?2",
            params![guild_id, event_type.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(channel.filter(|c| !c.is_empty()))
}

/// Flips the enabled flag for one event type and returns the new state.
///
/// A type with no stored row counts as enabled, so the first toggle on an
/// untouched type disables it (`false`). The flip is one statement: the row
/// is inserted as disabled, or the stored flag is negated in place.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn toggle(
    conn: &Connection,
    guild_id: &str,
    event_type: EventType,
) -> Result<bool, SettingsError> {
    let enabled: bool = conn.query_row(
        "INSERT INTO type_toggles (guild_id, event_type, enabled) VALUES (?1, ?2, 0)
         ON CONFLICT(guild_id, event_type) DO UPDATE SET
            enabled = 1 - type_toggles.enabled,
            updated_at = datetime('now')
         RETURNING enabled",
        params![guild_id, event_type.as_str()],
        |row| row.get(0),
    )?;

    tracing::debug!(
        guild_id,
        event_type = event_type.as_str(),
        enabled,
        "log type toggled"
    );

    Ok(enabled)
}

/// Returns whether an event type is enabled. Types with no row are enabled.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn is_enabled(
    conn: &Connection,
    guild_id: &str,
    event_type: EventType,
) -> Result<bool, SettingsError> {
    let enabled: Option<bool> = conn
        .query_row(
            "SELECT enabled FROM type_toggles WHERE guild_id = ?1 AND event_type = ?2",
            params![guild_id, event_type.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(enabled.unwrap_or(true))
}

/// Deletes every per-type destination override for a community.
///
/// Toggles and the global destination are untouched. Returns the number of
/// overrides removed.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn clear_type_overrides(conn: &Connection, guild_id: &str) -> Result<usize, SettingsError> {
    let removed = conn.execute(
        "DELETE FROM type_overrides WHERE guild_id = ?1",
        params![guild_id],
    )?;
    Ok(removed)
}

/// A read-only summary of one community's settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildSettings {
    pub guild_id: String,
    pub global_log_channel: Option<String>,
    /// Event type → destination, for every type with an override.
    pub overrides: BTreeMap<String, String>,
    /// Event types whose stored flag is off, in canonical order.
    pub disabled: Vec<EventType>,
}

/// Collects the full settings of one community.
///
/// Rows naming an event type this build does not know are skipped.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn guild_settings(conn: &Connection, guild_id: &str) -> Result<GuildSettings, SettingsError> {
    let global_log_channel = global_destination(conn, guild_id)?;

    let mut overrides = BTreeMap::new();
    let mut stmt = conn.prepare(
        "SELECT event_type, channel_id FROM type_overrides WHERE guild_id = ?1",
    )?;
    let rows = stmt.query_map(params![guild_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (event_type, channel_id) = row?;
        if event_type.parse::<EventType>().is_err() {
            tracing::warn!(
                guild_id,
                event_type = %event_type,
                "skipping override for unknown event type"
            );
            continue;
        }
        overrides.insert(event_type, channel_id);
    }

    let mut stmt = conn.prepare(
        "SELECT event_type FROM type_toggles WHERE guild_id = ?1 AND enabled = 0",
    )?;
    let rows = stmt.query_map(params![guild_id], |row| row.get::<_, String>(0))?;
    let mut disabled = Vec::new();
    for row in rows {
        let label = row?;
        match label.parse::<EventType>() {
            Ok(t) => disabled.push(t),
            Err(e) => tracing::warn!(guild_id, "skipping toggle row: {}", e),
        }
    }
    disabled.sort_by_key(|t| EventType::ALL.iter().position(|a| a == t));

    Ok(GuildSettings {
        guild_id: guild_id.to_string(),
        global_log_channel,
        overrides,
        disabled,
    })
}
