//! Per-community logging settings and destination routing.
//!
//! Three kinds of row are stored per community:
//!
//! | Table | Key | Meaning when absent |
//! |-------|-----|---------------------|
//! | `guilds` | community | no global destination |
//! | `type_overrides` | (community, event type) | fall back to the global destination |
//! | `type_toggles` | (community, event type) | **enabled** |
//!
//! [`resolve_destination`] combines them: a disabled type is suppressed
//! before any destination is looked up, an override beats the global
//! destination, and a community with neither is unconfigured.
//!
//! # Usage
//!
//! ```rust,ignore
//! use modlog_settings::{resolve_destination, set_global_destination, Route};
//! use modlog_types::EventType;
//!
//! set_global_destination(&conn, "guild-1", "channel-9")?;
//! match resolve_destination(&conn, "guild-1", EventType::MessageDeleted)? {
//!     Route::Deliver(channel) => send_to(channel),
//!     Route::Suppressed | Route::Unconfigured => {}
//! }
//! ```

mod error;
mod routing;
mod store;

pub use error::SettingsError;
pub use routing::{decide, resolve_destination, Route};
pub use store::{
    clear_type_overrides, global_destination, guild_settings, is_enabled,
    set_global_destination, set_type_override, toggle, type_override, GuildSettings,
};
