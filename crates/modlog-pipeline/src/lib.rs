//! Event correlation and delivery routing.
//!
//! Turns raw community notifications into [`LogRecord`]s, attributes an
//! actor to each record from the platform audit trail when the payload does
//! not carry one, and delivers a rendered copy to the destination the
//! community configured for that event type.
//!
//! ```text
//! RawEvent ──normalize──▶ LogRecord* ──correlate──▶ LogRecord ──dispatch──▶ destination
//!                          (0..n)        (AuditQuery)               (settings + DestinationSender)
//! ```
//!
//! Each record produced from one raw event is correlated and dispatched in
//! its own task. A failure anywhere in one record's path is logged and
//! dropped; it never reaches another record or the event source.
//!
//! The platform itself is reached only through the traits in [`platform`]:
//! [`AuditQuery`], [`DestinationSender`] and [`EventSource`]. [`DiscordRest`]
//! implements the first two over the platform's REST API.
//!
//! [`LogRecord`]: modlog_types::LogRecord

pub mod correlate;
pub mod discord;
pub mod dispatch;
pub mod normalize;
pub mod pipeline;
pub mod platform;
pub mod raw;
pub mod render;

pub use correlate::{accept_entry, AuditCorrelator, CORRELATION_WINDOW};
pub use discord::DiscordRest;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use normalize::{normalize, Records};
pub use pipeline::{Pipeline, DEFAULT_DRAIN_TIMEOUT};
pub use platform::{
    AuditEntry, AuditQuery, ChannelEventSource, ChannelHandle, DestinationSender, EventSource,
    PlatformError,
};
pub use raw::RawEvent;
pub use render::render;
