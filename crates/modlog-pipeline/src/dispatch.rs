//! Routing, rendering and delivery of one log record.
//!
//! The dispatcher never returns an error. Every failure is logged and
//! reported through [`DispatchOutcome`] so callers (and tests) can tell what
//! happened without the failure reaching other records.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use modlog_db::DbPool;
use modlog_settings::{resolve_destination, Route, SettingsError};
use modlog_types::{EventType, LogRecord};
use tokio::sync::RwLock;

use crate::platform::{ChannelHandle, DestinationSender, PlatformError};
use crate::render::render;

/// Default deadline for resolving a destination or sending to it.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a settings lookup for a record could not complete.
#[derive(Debug, thiserror::Error)]
enum RouteError {
    #[error("db connection failed: {0}")]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("settings task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What happened to a dispatched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sent to the destination.
    Delivered { destination: String },
    /// The event type is disabled for the community.
    Suppressed,
    /// The community has no destination for the event type.
    Unconfigured,
    /// The destination could not be resolved. Nothing was sent anywhere.
    DestinationUnavailable { destination: String },
    /// The destination resolved but the send failed.
    SendFailed { destination: String },
    /// The settings could not be read.
    StoreFailed,
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Delivers records to their configured destinations.
pub struct Dispatcher {
    pool: DbPool,
    sender: Arc<dyn DestinationSender>,
    channels: RwLock<HashMap<String, ChannelHandle>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(pool: DbPool, sender: Arc<dyn DestinationSender>) -> Self {
        Self {
            pool,
            sender,
            channels: RwLock::new(HashMap::new()),
            timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Bound destination lookups and sends by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Routes, renders and delivers `record` at most once.
    pub async fn dispatch(&self, record: &LogRecord) -> DispatchOutcome {
        let guild_id = record.guild_id.as_str();
        let event_type = record.event_type;

        let destination = match self.route(guild_id, event_type).await {
            Ok(Route::Deliver(destination)) => destination,
            Ok(Route::Suppressed) => {
                tracing::debug!(guild_id, event_type = %event_type, "log type disabled");
                return DispatchOutcome::Suppressed;
            }
            Ok(Route::Unconfigured) => {
                tracing::debug!(guild_id, event_type = %event_type, "no log destination configured");
                return DispatchOutcome::Unconfigured;
            }
            Err(e) => {
                tracing::error!(guild_id, event_type = %event_type, error = %e, "settings lookup failed");
                return DispatchOutcome::StoreFailed;
            }
        };

        let channel = match self.channel(guild_id, &destination).await {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(
                    guild_id,
                    event_type = %event_type,
                    destination = %destination,
                    error = %e,
                    "log destination unavailable"
                );
                return DispatchOutcome::DestinationUnavailable { destination };
            }
        };

        let payload = render(record);
        let sent = tokio::time::timeout(self.timeout, self.sender.send(&channel, &payload))
            .await
            .unwrap_or_else(|_| Err(self.timed_out()));
        match sent {
            Ok(()) => {
                tracing::debug!(guild_id, event_type = %event_type, destination = %destination, "log delivered");
                DispatchOutcome::Delivered { destination }
            }
            Err(e) => {
                tracing::warn!(
                    guild_id,
                    event_type = %event_type,
                    destination = %destination,
                    error = %e,
                    "log send failed"
                );
                DispatchOutcome::SendFailed { destination }
            }
        }
    }

    async fn route(&self, guild_id: &str, event_type: EventType) -> Result<Route, RouteError> {
        let pool = self.pool.clone();
        let guild_id = guild_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Route, RouteError> {
            let conn = pool.get()?;
            Ok(resolve_destination(&conn, &guild_id, event_type)?)
        })
        .await?
    }

    /// Looks a destination up, from cache when possible. Only successful
    /// lookups are cached.
    async fn channel(&self, guild_id: &str, channel_id: &str) -> Result<ChannelHandle, PlatformError> {
        let cached = self.channels.read().await.get(channel_id).cloned();
        let channel = match cached {
            Some(channel) => channel,
            None => {
                let fetched = tokio::time::timeout(self.timeout, self.sender.resolve_channel(channel_id))
                    .await
                    .unwrap_or_else(|_| Err(self.timed_out()))?;
                self.channels
                    .write()
                    .await
                    .insert(channel_id.to_string(), fetched.clone());
                fetched
            }
        };

        match &channel.guild_id {
            Some(owner) if owner != guild_id => Err(PlatformError::ForeignChannel {
                channel_id: channel_id.to_string(),
                guild_id: guild_id.to_string(),
            }),
            _ => Ok(channel),
        }
    }

    fn timed_out(&self) -> PlatformError {
        PlatformError::Timeout(self.timeout.as_millis() as u64)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
