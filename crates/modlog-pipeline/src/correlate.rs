//! Actor attribution from the platform audit trail.
//!
//! The audit trail is written asynchronously by the platform, so the entry
//! for an observed event may arrive late or not at all. The correlator asks
//! for the single most recent entry of the expected kind and accepts its
//! executor only when the entry is younger than [`CORRELATION_WINDOW`] at
//! the moment the answer is evaluated.
//!
//! Known limit: the entry's target is not compared against the record's
//! subject. Two same-kind actions against different subjects inside one
//! window can be attributed to the wrong executor.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use modlog_types::{AuditActionKind, LogRecord, UserRef};

use crate::platform::{AuditEntry, AuditQuery, PlatformError};

/// How old an audit entry may be and still name the actor.
pub const CORRELATION_WINDOW: Duration = Duration::from_millis(5000);

/// Default per-call deadline for the audit fetch.
pub const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether `entry` is fresh enough at `now` to name the actor.
///
/// An entry stamped in the future (clock skew between the platform and this
/// host) counts as fresh.
pub fn accept_entry(entry: &AuditEntry, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(entry.created_at);
    match TimeDelta::from_std(CORRELATION_WINDOW) {
        Ok(window) => age < window,
        Err(_) => false,
    }
}

/// Attaches actors to records using an [`AuditQuery`].
#[derive(Clone)]
pub struct AuditCorrelator {
    audit: Arc<dyn AuditQuery>,
    timeout: Duration,
}

impl AuditCorrelator {
    pub fn new(audit: Arc<dyn AuditQuery>) -> Self {
        Self {
            audit,
            timeout: DEFAULT_AUDIT_TIMEOUT,
        }
    }

    /// Bound every audit fetch by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The most recent actor for `kind` in a community, if one is fresh.
    ///
    /// Every failure (timeout, transport error, empty trail, stale entry,
    /// entry without executor) yields `None`.
    pub async fn correlate(&self, guild_id: &str, kind: AuditActionKind) -> Option<UserRef> {
        let fetched = tokio::time::timeout(self.timeout, self.audit.latest_entry(guild_id, kind))
            .await
            .unwrap_or_else(|_| Err(PlatformError::Timeout(self.timeout.as_millis() as u64)));

        let entry = match fetched {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::debug!(guild_id, audit_kind = kind.code(), "no audit entry");
                return None;
            }
            Err(e) => {
                tracing::warn!(guild_id, audit_kind = kind.code(), error = %e, "audit fetch failed");
                return None;
            }
        };

        if !accept_entry(&entry, Utc::now()) {
            tracing::debug!(
                guild_id,
                audit_kind = kind.code(),
                entry_id = %entry.id,
                created_at = %entry.created_at,
                "audit entry outside correlation window"
            );
            return None;
        }
        entry.executor
    }

    /// Fills in the actor of a record whose type is correlated and whose
    /// payload did not already name one.
    pub async fn enrich(&self, mut record: LogRecord) -> LogRecord {
        if record.actor.is_some() {
            return record;
        }
        let Some(kind) = record.event_type.audit_kind() else {
            return record;
        };
        record.actor = self.correlate(&record.guild_id, kind).await;
        record
    }
}

impl std::fmt::Debug for AuditCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditCorrelator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
