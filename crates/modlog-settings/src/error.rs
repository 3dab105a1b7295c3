//! Error types for the settings store.

/// Errors that can occur during settings reads and writes.
///
/// Absence of configuration is never an error; every read returns an
/// `Option` or a defaulted value instead.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A database operation failed.
    #[error("settings database error: {0}")]
    Database(#[from] rusqlite::Error),
}
