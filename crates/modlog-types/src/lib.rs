//! Shared types for the modlog workspace.
//!
//! This crate defines the fixed event-type enumeration that keys every
//! per-community setting, the platform audit action kinds used for actor
//! correlation, and the canonical [`LogRecord`] produced for each observed
//! event.
//!
//! No crate in the workspace depends on anything *except* `modlog-types` for
//! cross-cutting type definitions.

use serde::{Deserialize, Serialize};

mod record;

pub use record::{
    ChannelRef, ChannelSnapshot, FieldChange, LogRecord, MessageSnapshot, RoleRef, RoleSnapshot,
    Snapshot, Subject, UserRef,
};

/// The categories of community events that can be logged.
///
/// The string form (see [`EventType::as_str`]) is what gets persisted in the
/// settings tables and accepted by the administrative surface, so it must
/// never change for an existing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    MessageDeleted,
    MessageEdited,
    ReactionAdded,
    ReactionRemoved,
    VcJoined,
    VcLeft,
    VcMoved,
    ChannelCreated,
    ChannelUpdated,
    ChannelDeleted,
    UserJoined,
    UserLeft,
    RoleCreated,
    RoleUpdated,
    RoleDeleted,
    RoleGiven,
    RoleTaken,
    InviteCreated,
    InviteDeleted,
}

impl EventType {
    /// Every event type, in display order.
    pub const ALL: [EventType; 19] = [
        Self::MessageDeleted,
        Self::MessageEdited,
        Self::ReactionAdded,
        Self::ReactionRemoved,
        Self::VcJoined,
        Self::VcLeft,
        Self::VcMoved,
        Self::ChannelCreated,
        Self::ChannelUpdated,
        Self::ChannelDeleted,
        Self::UserJoined,
        Self::UserLeft,
        Self::RoleCreated,
        Self::RoleUpdated,
        Self::RoleDeleted,
        Self::RoleGiven,
        Self::RoleTaken,
        Self::InviteCreated,
        Self::InviteDeleted,
    ];

    /// Returns the canonical string label for this event type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageDeleted => "messageDeleted",
            Self::MessageEdited => "messageEdited",
            Self::ReactionAdded => "reactionAdded",
            Self::ReactionRemoved => "reactionRemoved",
            Self::VcJoined => "vcJoined",
            Self::VcLeft => "vcLeft",
            Self::VcMoved => "vcMoved",
            Self::ChannelCreated => "channelCreated",
            Self::ChannelUpdated => "channelUpdated",
            Self::ChannelDeleted => "channelDeleted",
            Self::UserJoined => "userJoined",
            Self::UserLeft => "userLeft",
            Self::RoleCreated => "roleCreated",
            Self::RoleUpdated => "roleUpdated",
            Self::RoleDeleted => "roleDeleted",
            Self::RoleGiven => "roleGiven",
            Self::RoleTaken => "roleTaken",
            Self::InviteCreated => "inviteCreated",
            Self::InviteDeleted => "inviteDeleted",
        }
    }

    /// The audit action kind whose most recent entry names the actor for
    /// this event type, if the type is correlated at all.
    ///
    /// Member joins and departures, reactions, voice transitions and message
    /// edits either carry their actor in the platform payload or have none.
    pub fn audit_kind(self) -> Option<AuditActionKind> {
        match self {
            Self::MessageDeleted => Some(AuditActionKind::MessageDelete),
            Self::ChannelCreated => Some(AuditActionKind::ChannelCreate),
            Self::ChannelUpdated => Some(AuditActionKind::ChannelUpdate),
            Self::ChannelDeleted => Some(AuditActionKind::ChannelDelete),
            Self::RoleCreated => Some(AuditActionKind::RoleCreate),
            Self::RoleUpdated => Some(AuditActionKind::RoleUpdate),
            Self::RoleDeleted => Some(AuditActionKind::RoleDelete),
            Self::RoleGiven | Self::RoleTaken => Some(AuditActionKind::MemberRoleUpdate),
            Self::InviteCreated => Some(AuditActionKind::InviteCreate),
            Self::InviteDeleted => Some(AuditActionKind::InviteDelete),
            Self::MessageEdited
            | Self::ReactionAdded
            | Self::ReactionRemoved
            | Self::VcJoined
            | Self::VcLeft
            | Self::VcMoved
            | Self::UserJoined
            | Self::UserLeft => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEventTypeError(s.to_string()))
    }
}

/// Error returned when parsing an unknown event type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct ParseEventTypeError(pub String);

/// Platform audit-trail action kinds used for actor correlation.
///
/// Discriminants are the platform's numeric `action_type` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum AuditActionKind {
    ChannelCreate = 10,
    ChannelUpdate = 11,
    ChannelDelete = 12,
    MemberRoleUpdate = 25,
    RoleCreate = 30,
    RoleUpdate = 31,
    RoleDelete = 32,
    InviteCreate = 40,
    InviteDelete = 42,
    MessageDelete = 72,
}

impl AuditActionKind {
    /// Returns the platform's numeric code for this action kind.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Attempts to convert a numeric code to an `AuditActionKind`.
    ///
    /// Returns `None` for codes this system never correlates against.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            10 => Some(Self::ChannelCreate),
            11 => Some(Self::ChannelUpdate),
            12 => Some(Self::ChannelDelete),
            25 => Some(Self::MemberRoleUpdate),
            30 => Some(Self::RoleCreate),
            31 => Some(Self::RoleUpdate),
            32 => Some(Self::RoleDelete),
            40 => Some(Self::InviteCreate),
            42 => Some(Self::InviteDelete),
            72 => Some(Self::MessageDelete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_string_round_trip() {
        for t in EventType::ALL {
            let parsed: EventType = t.as_str().parse().expect("known type should parse");
            assert_eq!(parsed, t);
        }
    }

    #[test]
    fn event_type_serde_matches_as_str() {
        for t in EventType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn event_type_rejects_unknown() {
        let err = "messageExploded".parse::<EventType>().unwrap_err();
        assert_eq!(err, ParseEventTypeError("messageExploded".to_string()));
        // Labels are case-sensitive.
        assert!("MessageDeleted".parse::<EventType>().is_err());
    }

    #[test]
    fn all_contains_nineteen_distinct_types() {
        let mut labels: Vec<&str> = EventType::ALL.iter().map(|t| t.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 19);
    }

    #[test]
    fn role_membership_types_share_an_audit_kind() {
        assert_eq!(
            EventType::RoleGiven.audit_kind(),
            Some(AuditActionKind::MemberRoleUpdate)
        );
        assert_eq!(
            EventType::RoleTaken.audit_kind(),
            Some(AuditActionKind::MemberRoleUpdate)
        );
        assert_eq!(
            EventType::RoleCreated.audit_kind(),
            Some(AuditActionKind::RoleCreate)
        );
    }

    #[test]
    fn uncorrelated_types_have_no_audit_kind() {
        for t in [
            EventType::UserLeft,
            EventType::UserJoined,
            EventType::ReactionRemoved,
            EventType::VcMoved,
            EventType::MessageEdited,
        ] {
            assert_eq!(t.audit_kind(), None, "{t} should not be correlated");
        }
    }

    #[test]
    fn audit_kind_code_round_trip() {
        for kind in [
            AuditActionKind::ChannelCreate,
            AuditActionKind::ChannelUpdate,
            AuditActionKind::ChannelDelete,
            AuditActionKind::MemberRoleUpdate,
            AuditActionKind::RoleCreate,
            AuditActionKind::RoleUpdate,
            AuditActionKind::RoleDelete,
            AuditActionKind::InviteCreate,
            AuditActionKind::InviteDelete,
            AuditActionKind::MessageDelete,
        ] {
            assert_eq!(AuditActionKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(AuditActionKind::from_code(0), None);
        assert_eq!(AuditActionKind::MessageDelete.code(), 72);
    }
}
