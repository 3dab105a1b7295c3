//! The canonical log record and the entity shapes it refers to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EventType;

/// A platform user as seen in an event payload or audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Platform user identifier.
    pub id: String,
    /// Human-readable handle (e.g. `name` or `name#1234`).
    pub tag: String,
    /// Whether the account is an automated bot.
    #[serde(default)]
    pub bot: bool,
}

/// A role reference (identifier plus display name at event time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: String,
    pub name: String,
}

/// A channel reference (identifier plus display name at event time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    pub name: String,
}

/// The entity an event is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    /// A message, identified by id within its channel.
    Message {
        id: String,
        channel_id: String,
        /// The author, when the platform still had the message cached.
        author: Option<UserRef>,
        /// Text content, when known. `None` for uncached messages.
        content: Option<String>,
    },
    /// A reaction on a message by a specific user.
    Reaction {
        message_id: String,
        channel_id: String,
        emoji: String,
        user: UserRef,
    },
    /// A community member (joins and departures).
    Member { user: UserRef },
    /// A role being granted to or removed from a member.
    MemberRole { user: UserRef, role: RoleRef },
    /// A community role.
    Role { role: RoleRef },
    /// A community channel.
    Channel { channel: ChannelRef },
    /// An invite code.
    Invite {
        code: String,
        channel_id: Option<String>,
    },
    /// A member's voice presence transition.
    Voice {
        user: UserRef,
        from: Option<ChannelRef>,
        to: Option<ChannelRef>,
    },
}

/// Message state compared for edit detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSnapshot {
    pub content: Option<String>,
}

/// The role attributes whose change is worth reporting.
///
/// Position is not compared; reordering one role shifts the position
/// of every role below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    pub name: String,
    #[serde(default)]
    pub color: u32,
    /// Permission bitset as the platform's decimal string.
    #[serde(default)]
    pub permissions: String,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub mentionable: bool,
}

/// The channel attributes whose change is worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub name: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub rate_limit_per_user: u32,
}

/// A comparable before/after state for update events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    Message(MessageSnapshot),
    Role(RoleSnapshot),
    Channel(ChannelSnapshot),
}

/// One attribute that differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: String,
    pub after: String,
}

fn opt_label(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "(none)".to_string())
}

fn push_change(out: &mut Vec<FieldChange>, field: &'static str, before: String, after: String) {
    if before != after {
        out.push(FieldChange {
            field,
            before,
            after,
        });
    }
}

impl Snapshot {
    /// Lists the attributes that differ from `after`.
    ///
    /// Snapshots of different kinds are never produced for the same record;
    /// comparing them yields no changes.
    pub fn changes(&self, after: &Snapshot) -> Vec<FieldChange> {
        let mut out = Vec::new();
        match (self, after) {
            (Snapshot::Message(b), Snapshot::Message(a)) => {
                push_change(&mut out, "content", opt_label(&b.content), opt_label(&a.content));
            }
            (Snapshot::Role(b), Snapshot::Role(a)) => {
                push_change(&mut out, "name", b.name.clone(), a.name.clone());
                push_change(
                    &mut out,
                    "color",
                    format!("#{:06X}", b.color),
                    format!("#{:06X}", a.color),
                );
                push_change(
                    &mut out,
                    "permissions",
                    b.permissions.clone(),
                    a.permissions.clone(),
                );
                push_change(&mut out, "hoist", b.hoist.to_string(), a.hoist.to_string());
                push_change(
                    &mut out,
                    "mentionable",
                    b.mentionable.to_string(),
                    a.mentionable.to_string(),
                );
            }
            (Snapshot::Channel(b), Snapshot::Channel(a)) => {
                push_change(&mut out, "name", b.name.clone(), a.name.clone());
                push_change(&mut out, "topic", opt_label(&b.topic), opt_label(&a.topic));
                push_change(&mut out, "nsfw", b.nsfw.to_string(), a.nsfw.to_string());
                push_change(
                    &mut out,
                    "category",
                    opt_label(&b.parent_id),
                    opt_label(&a.parent_id),
                );
                push_change(
                    &mut out,
                    "slowmode",
                    format!("{}s", b.rate_limit_per_user),
                    format!("{}s", a.rate_limit_per_user),
                );
            }
            _ => {}
        }
        out
    }
}

/// The normalized form of one observed community event.
///
/// Built by the normalizer, optionally enriched with an actor, and consumed
/// by a single dispatch. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub event_type: EventType,
    pub guild_id: String,
    pub occurred_at: DateTime<Utc>,
    pub subject: Subject,
    /// The user responsible for the event, when known.
    pub actor: Option<UserRef>,
    pub before: Option<Snapshot>,
    pub after: Option<Snapshot>,
}

impl LogRecord {
    /// Create a record with no actor and no state pair.
    pub fn new(
        event_type: EventType,
        guild_id: impl Into<String>,
        occurred_at: DateTime<Utc>,
        subject: Subject,
    ) -> Self {
        Self {
            event_type,
            guild_id: guild_id.into(),
            occurred_at,
            subject,
            actor: None,
            before: None,
            after: None,
        }
    }

    /// Set the responsible user.
    pub fn with_actor(mut self, actor: UserRef) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attach the before/after pair of an update event.
    pub fn with_states(mut self, before: Snapshot, after: Snapshot) -> Self {
        self.before = Some(before);
        self.after = Some(after);
        self
    }

    /// The attributes that changed, for update records.
    pub fn changes(&self) -> Vec<FieldChange> {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => before.changes(after),
            _ => Vec::new(),
        }
    }
}
