//! Destination resolution for a (community, event type) pair.

use modlog_types::EventType;
use rusqlite::Connection;

use crate::error::SettingsError;
use crate::store::{global_destination, is_enabled, type_override};

/// Where a record of a given type should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Deliver to this destination.
    Deliver(String),
    /// The type is disabled for the community; drop silently.
    Suppressed,
    /// No destination is configured; drop silently.
    Unconfigured,
}

impl Route {
    /// The destination to deliver to, if any.
    pub fn destination(&self) -> Option<&str> {
        match self {
            Route::Deliver(channel) => Some(channel),
            Route::Suppressed | Route::Unconfigured => None,
        }
    }
}

/// The routing decision table.
///
/// | enabled | override | global | route |
/// |---------|----------|--------|-------|
/// | no      | any      | any    | `Suppressed` |
/// | yes     | `o`      | any    | `Deliver(o)` |
/// | yes     | none     | `g`    | `Deliver(g)` |
/// | yes     | none     | none   | `Unconfigured` |
pub fn decide(enabled: bool, type_override: Option<String>, global: Option<String>) -> Route {
    match (enabled, type_override, global) {
        (false, _, _) => Route::Suppressed,
        (true, Some(channel), _) => Route::Deliver(channel),
        (true, None, Some(channel)) => Route::Deliver(channel),
        (true, None, None) => Route::Unconfigured,
    }
}

/// Resolves the route for one event type in one community.
///
/// The toggle is read first; a disabled type never touches the destination
/// tables.
///
/// # Errors
///
/// Returns `SettingsError::Database` on SQL failure.
pub fn resolve_destination(
    conn: &Connection,
    guild_id: &str,
    event_type: EventType,
) -> Result<Route, SettingsError> {
    if !is_enabled(conn, guild_id, event_type)? {
        return Ok(decide(false, None, None));
    }
    let over = type_override(conn, guild_id, event_type)?;
    let global = match over {
        Some(_) => None,
        None => global_destination(conn, guild_id)?,
    };
    Ok(decide(true, over, global))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn disabled_suppresses_regardless_of_destinations() {
        assert_eq!(decide(false, s("o"), s("g")), Route::Suppressed);
        assert_eq!(decide(false, None, s("g")), Route::Suppressed);
        assert_eq!(decide(false, None, None), Route::Suppressed);
    }

    #[test]
    fn override_beats_global() {
        assert_eq!(decide(true, s("o"), s("g")), Route::Deliver("o".to_string()));
        assert_eq!(decide(true, s("o"), None), Route::Deliver("o".to_string()));
    }

    #[test]
    fn global_is_the_fallback() {
        assert_eq!(decide(true, None, s("g")), Route::Deliver("g".to_string()));
        assert_eq!(decide(true, None, None), Route::Unconfigured);
    }

    #[test]
    fn destination_accessor() {
        assert_eq!(Route::Deliver("c".to_string()).destination(), Some("c"));
        assert_eq!(Route::Suppressed.destination(), None);
        assert_eq!(Route::Unconfigured.destination(), None);
    }
}
