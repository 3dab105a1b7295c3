//! Raw platform notifications, as delivered by the platform client.
//!
//! Update notifications carry both the cached prior state and the new
//! state. Every variant carries an optional community id; notifications
//! from outside a community (direct messages) have none.

use modlog_types::{ChannelRef, ChannelSnapshot, RoleRef, RoleSnapshot, UserRef};
use serde::{Deserialize, Serialize};

/// A message as known to the platform client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub channel_id: String,
    /// `None` when the message was not cached before deletion.
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A role as known to the platform client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRole {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub permissions: String,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub mentionable: bool,
    #[serde(default)]
    pub position: i64,
}

impl RawRole {
    pub fn to_ref(&self) -> RoleRef {
        RoleRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn snapshot(&self) -> RoleSnapshot {
        RoleSnapshot {
            name: self.name.clone(),
            color: self.color,
            permissions: self.permissions.clone(),
            hoist: self.hoist,
            mentionable: self.mentionable,
        }
    }
}

/// A channel as known to the platform client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub rate_limit_per_user: u32,
    #[serde(default)]
    pub position: i64,
}

impl RawChannel {
    pub fn to_ref(&self) -> ChannelRef {
        ChannelRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            name: self.name.clone(),
            topic: self.topic.clone(),
            nsfw: self.nsfw,
            parent_id: self.parent_id.clone(),
            rate_limit_per_user: self.rate_limit_per_user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInvite {
    pub code: String,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReaction {
    pub message_id: String,
    pub channel_id: String,
    /// Rendered emoji (unicode, or `<:name:id>` for custom emoji).
    pub emoji: String,
    pub user: UserRef,
}

/// A platform notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RawEvent {
    MessageDelete {
        #[serde(default)]
        guild_id: Option<String>,
        message: RawMessage,
    },
    MessageUpdate {
        #[serde(default)]
        guild_id: Option<String>,
        before: RawMessage,
        after: RawMessage,
    },
    MemberAdd {
        #[serde(default)]
        guild_id: Option<String>,
        user: UserRef,
    },
    MemberRemove {
        #[serde(default)]
        guild_id: Option<String>,
        user: UserRef,
    },
    MemberUpdate {
        #[serde(default)]
        guild_id: Option<String>,
        user: UserRef,
        before_roles: Vec<RoleRef>,
        after_roles: Vec<RoleRef>,
    },
    RoleCreate {
        #[serde(default)]
        guild_id: Option<String>,
        role: RawRole,
    },
    RoleUpdate {
        #[serde(default)]
        guild_id: Option<String>,
        before: RawRole,
        after: RawRole,
    },
    RoleDelete {
        #[serde(default)]
        guild_id: Option<String>,
        role: RawRole,
    },
    ChannelCreate {
        #[serde(default)]
        guild_id: Option<String>,
        channel: RawChannel,
    },
    ChannelUpdate {
        #[serde(default)]
        guild_id: Option<String>,
        before: RawChannel,
        after: RawChannel,
    },
    ChannelDelete {
        #[serde(default)]
        guild_id: Option<String>,
        channel: RawChannel,
    },
    InviteCreate {
        #[serde(default)]
        guild_id: Option<String>,
        invite: RawInvite,
    },
    InviteDelete {
        #[serde(default)]
        guild_id: Option<String>,
        invite: RawInvite,
    },
    ReactionAdd {
        #[serde(default)]
        guild_id: Option<String>,
        reaction: RawReaction,
    },
    ReactionRemove {
        #[serde(default)]
        guild_id: Option<String>,
        reaction: RawReaction,
    },
    VoiceStateUpdate {
        #[serde(default)]
        guild_id: Option<String>,
        user: UserRef,
        #[serde(default)]
        before: Option<ChannelRef>,
        #[serde(default)]
        after: Option<ChannelRef>,
    },
}

impl RawEvent {
    /// The community the notification came from, if any.
    pub fn guild_id(&self) -> Option<&str> {
        let id = match self {
            Self::MessageDelete { guild_id, .. }
            | Self::MessageUpdate { guild_id, .. }
            | Self::MemberAdd { guild_id, .. }
            | Self::MemberRemove { guild_id, .. }
            | Self::MemberUpdate { guild_id, .. }
            | Self::RoleCreate { guild_id, .. }
            | Self::RoleUpdate { guild_id, .. }
            | Self::RoleDelete { guild_id, .. }
            | Self::ChannelCreate { guild_id, .. }
            | Self::ChannelUpdate { guild_id, .. }
            | Self::ChannelDelete { guild_id, .. }
            | Self::InviteCreate { guild_id, .. }
            | Self::InviteDelete { guild_id, .. }
            | Self::ReactionAdd { guild_id, .. }
            | Self::ReactionRemove { guild_id, .. }
            | Self::VoiceStateUpdate { guild_id, .. } => guild_id,
        };
        id.as_deref()
    }

    /// The notification kind label, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MessageDelete { .. } => "MESSAGE_DELETE",
            Self::MessageUpdate { .. } => "MESSAGE_UPDATE",
            Self::MemberAdd { .. } => "MEMBER_ADD",
            Self::MemberRemove { .. } => "MEMBER_REMOVE",
            Self::MemberUpdate { .. } => "MEMBER_UPDATE",
            Self::RoleCreate { .. } => "ROLE_CREATE",
            Self::RoleUpdate { .. } => "ROLE_UPDATE",
            Self::RoleDelete { .. } => "ROLE_DELETE",
            Self::ChannelCreate { .. } => "CHANNEL_CREATE",
            Self::ChannelUpdate { .. } => "CHANNEL_UPDATE",
            Self::ChannelDelete { .. } => "CHANNEL_DELETE",
            Self::InviteCreate { .. } => "INVITE_CREATE",
            Self::InviteDelete { .. } => "INVITE_DELETE",
            Self::ReactionAdd { .. } => "REACTION_ADD",
            Self::ReactionRemove { .. } => "REACTION_REMOVE",
            Self::VoiceStateUpdate { .. } => "VOICE_STATE_UPDATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_payload() {
        let json = r#"{
            "kind": "MESSAGE_DELETE",
            "guild_id": "g1",
            "message": {"id": "m1", "channel_id": "c1", "content": "hi"}
        }"#;
        let event: RawEvent = serde_json::from_str(json).expect("should parse");
        assert_eq!(event.guild_id(), Some("g1"));
        assert_eq!(event.kind(), "MESSAGE_DELETE");
        match event {
            RawEvent::MessageDelete { message, .. } => {
                assert_eq!(message.content.as_deref(), Some("hi"));
                assert!(message.author.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn missing_guild_defaults_to_none() {
        let json = r#"{
            "kind": "MEMBER_ADD",
            "user": {"id": "u1", "tag": "alice"}
        }"#;
        let event: RawEvent = serde_json::from_str(json).expect("should parse");
        assert_eq!(event.guild_id(), None);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{"kind": "TYPING_START", "guild_id": "g1"}"#;
        assert!(serde_json::from_str::<RawEvent>(json).is_err());
    }
}
