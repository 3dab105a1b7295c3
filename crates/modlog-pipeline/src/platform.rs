//! Collaborator interfaces to the chat platform.
//!
//! The pipeline never talks to the platform directly. It is handed
//! implementations of these traits at construction, which lets tests
//! substitute in-process doubles for the network.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modlog_types::{AuditActionKind, UserRef};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::raw::RawEvent;

/// Errors reported by platform collaborators.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status.
    #[error("platform returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The call did not finish within its deadline.
    #[error("platform call timed out after {0}ms")]
    Timeout(u64),

    /// The response body did not have the expected shape.
    #[error("unexpected platform response: {0}")]
    Decode(String),

    /// The destination exists but belongs to a different community.
    #[error("channel {channel_id} does not belong to community {guild_id}")]
    ForeignChannel { channel_id: String, guild_id: String },
}

/// One entry from the platform audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub id: String,
    pub kind: AuditActionKind,
    /// The user who performed the action, if the platform reports one.
    pub executor: Option<UserRef>,
    /// The entity the action targeted. Not compared against the event
    /// subject; see [`crate::correlate`].
    pub target_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A resolved, deliverable destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: String,
    pub name: Option<String>,
    /// Owning community, when the platform reports it.
    pub guild_id: Option<String>,
}

/// Read access to a community's audit trail.
#[async_trait]
pub trait AuditQuery: Send + Sync {
    /// Fetch the single most recent audit entry of `kind` in a community.
    ///
    /// Returns `Ok(None)` when the trail holds no entry of that kind.
    async fn latest_entry(
        &self,
        guild_id: &str,
        kind: AuditActionKind,
    ) -> Result<Option<AuditEntry>, PlatformError>;
}

/// Delivery of rendered payloads to destinations.
#[async_trait]
pub trait DestinationSender: Send + Sync {
    /// Look up a destination so it can be sent to.
    async fn resolve_channel(&self, channel_id: &str) -> Result<ChannelHandle, PlatformError>;

    /// Send one rendered payload.
    async fn send(&self, channel: &ChannelHandle, payload: &Value) -> Result<(), PlatformError>;
}

/// A stream of raw platform events.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event. `None` means the source is closed.
    async fn next_event(&mut self) -> Option<RawEvent>;
}

/// An [`EventSource`] fed through a tokio channel.
///
/// Whatever receives events from the platform (a gateway client, an HTTP
/// relay) holds the sender half.
#[derive(Debug)]
pub struct ChannelEventSource {
    rx: mpsc::Receiver<RawEvent>,
}

impl ChannelEventSource {
    /// Create a bounded source and the sender that feeds it.
    pub fn bounded(capacity: usize) -> (mpsc::Sender<RawEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

impl From<mpsc::Receiver<RawEvent>> for ChannelEventSource {
    fn from(rx: mpsc::Receiver<RawEvent>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn next_event(&mut self) -> Option<RawEvent> {
        self.rx.recv().await
    }
}
