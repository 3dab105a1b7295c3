//! Embed rendering for log records.

use modlog_types::{EventType, LogRecord, Snapshot, Subject};
use serde_json::{json, Value};

use crate::normalize::subject_user;

/// Embed colours, matching the platform client's named palette.
const RED: u32 = 0xE74C3C;
const GREEN: u32 = 0x2ECC71;
const BLUE: u32 = 0x3498DB;
const ORANGE: u32 = 0xE67E22;

/// Maximum length of an embed field value.
const FIELD_VALUE_LIMIT: usize = 1024;

const NO_CONTENT: &str = "(embed/attachment)";
const UNKNOWN: &str = "Unknown";

fn style(event_type: EventType) -> (&'static str, u32) {
    match event_type {
        EventType::MessageDeleted => ("🗑️ Message Deleted", RED),
        EventType::MessageEdited => ("✏️ Message Edited", ORANGE),
        EventType::ReactionAdded => ("➕ Reaction Added", GREEN),
        EventType::ReactionRemoved => ("➖ Reaction Removed", ORANGE),
        EventType::VcJoined => ("🔊 VC Joined", GREEN),
        EventType::VcLeft => ("🔇 VC Left", RED),
        EventType::VcMoved => ("🔀 VC Moved", ORANGE),
        EventType::ChannelCreated => ("📂 Channel Created", BLUE),
        EventType::ChannelUpdated => ("🔧 Channel Updated", ORANGE),
        EventType::ChannelDeleted => ("❌ Channel Deleted", RED),
        EventType::UserJoined => ("👋 User Joined", GREEN),
        EventType::UserLeft => ("🚪 User Left", RED),
        EventType::RoleCreated => ("➕ Role Created", BLUE),
        EventType::RoleUpdated => ("🔧 Role Updated", ORANGE),
        EventType::RoleDeleted => ("❌ Role Deleted", RED),
        EventType::RoleGiven => ("➕ Role Given", GREEN),
        EventType::RoleTaken => ("➖ Role Taken", RED),
        EventType::InviteCreated => ("➕ Invite Created", BLUE),
        EventType::InviteDeleted => ("❌ Invite Deleted", RED),
    }
}

/// Renders `record` as a chat message payload carrying one embed.
pub fn render(record: &LogRecord) -> Value {
    let (title, color) = style(record.event_type);
    let mut fields = Vec::new();

    match record.event_type {
        EventType::MessageDeleted => {
            let (content, author) = match &record.subject {
                Subject::Message {
                    content, author, ..
                } => (content.as_deref(), author.as_ref()),
                _ => (None, None),
            };
            fields.push(field("Content", content_or_placeholder(content)));
            // Without a fresh audit entry the author is the best guess.
            let deleter = record
                .actor
                .as_ref()
                .or(author)
                .map_or(UNKNOWN, |u| u.tag.as_str());
            fields.push(field("Deleter", deleter));
        }
        EventType::MessageEdited => {
            let content = |s: &Option<Snapshot>| match s {
                Some(Snapshot::Message(m)) => m.content.clone(),
                _ => None,
            };
            fields.push(field(
                "Before",
                content_or_placeholder(content(&record.before).as_deref()),
            ));
            fields.push(field(
                "After",
                content_or_placeholder(content(&record.after).as_deref()),
            ));
        }
        EventType::RoleUpdated | EventType::ChannelUpdated => {
            let changes = record.changes();
            let before: Vec<String> = changes
                .iter()
                .map(|c| format!("{}: {}", c.field, c.before))
                .collect();
            let after: Vec<String> = changes
                .iter()
                .map(|c| format!("{}: {}", c.field, c.after))
                .collect();
            fields.push(field("Before", &before.join("\n")));
            fields.push(field("After", &after.join("\n")));
            push_actor(&mut fields, record);
        }
        EventType::ReactionAdded | EventType::ReactionRemoved => {
            if let Subject::Reaction { emoji, .. } = &record.subject {
                fields.push(field("Emoji", emoji));
            }
        }
        EventType::VcJoined | EventType::VcLeft | EventType::VcMoved => {}
        EventType::UserJoined | EventType::UserLeft => {}
        _ => push_actor(&mut fields, record),
    }

    let mut embed = json!({
        "title": title,
        "description": describe(record),
        "color": color,
        "fields": fields,
        "timestamp": record.occurred_at.to_rfc3339(),
    });
    if let Some(user) = subject_user(&record.subject) {
        embed["footer"] = json!({ "text": format!("User ID: {}", user.id) });
    }
    json!({ "embeds": [embed] })
}

fn push_actor(fields: &mut Vec<Value>, record: &LogRecord) {
    if let Some(actor) = &record.actor {
        fields.push(field("By", &actor.tag));
    }
}

fn describe(record: &LogRecord) -> String {
    match &record.subject {
        Subject::Message {
            channel_id, author, ..
        } => match record.event_type {
            EventType::MessageEdited => {
                let who = record
                    .actor
                    .as_ref()
                    .or(author.as_ref())
                    .map_or(UNKNOWN, |u| u.tag.as_str());
                format!("{who} edited a message in <#{channel_id}>")
            }
            _ => format!("A message was deleted in <#{channel_id}>"),
        },
        Subject::Reaction {
            channel_id, user, ..
        } => match record.event_type {
            EventType::ReactionAdded => format!("{} added a reaction in <#{channel_id}>", user.tag),
            _ => format!("{} removed a reaction in <#{channel_id}>", user.tag),
        },
        Subject::Member { user } => match record.event_type {
            EventType::UserJoined => format!("{} joined the server.", user.tag),
            _ => format!("{} left the server.", user.tag),
        },
        Subject::MemberRole { user, role } => match record.event_type {
            EventType::RoleGiven => format!("{} was given role **{}**", user.tag, role.name),
            _ => format!("{} had role **{}** removed", user.tag, role.name),
        },
        Subject::Role { role } => {
            format!("Role **{}** was {}.", role.name, verb(record.event_type))
        }
        Subject::Channel { channel } => {
            format!("Channel **{}** was {}.", channel.name, verb(record.event_type))
        }
        Subject::Invite { code, .. } => {
            format!("Invite **{code}** was {}.", verb(record.event_type))
        }
        Subject::Voice { user, from, to } => match (from, to) {
            (Some(from), Some(to)) => {
                format!("{} moved from {} to {}", user.tag, from.name, to.name)
            }
            (None, Some(to)) => format!("{} joined {}", user.tag, to.name),
            (Some(from), None) => format!("{} left {}", user.tag, from.name),
            (None, None) => user.tag.clone(),
        },
    }
}

fn verb(event_type: EventType) -> &'static str {
    match event_type {
        EventType::RoleCreated | EventType::ChannelCreated | EventType::InviteCreated => "created",
        EventType::RoleDeleted | EventType::ChannelDeleted | EventType::InviteDeleted => "deleted",
        _ => "updated",
    }
}

fn content_or_placeholder(content: Option<&str>) -> &str {
    match content {
        Some(c) if !c.is_empty() => c,
        _ => NO_CONTENT,
    }
}

fn field(name: &str, value: &str) -> Value {
    json!({ "name": name, "value": truncate(value) })
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= FIELD_VALUE_LIMIT {
        return value.to_string();
    }
    let mut out: String = value.chars().take(FIELD_VALUE_LIMIT - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use modlog_types::{MessageSnapshot, RoleRef, RoleSnapshot, UserRef};

    fn user(tag: &str) -> UserRef {
        UserRef {
            id: format!("id-{tag}"),
            tag: tag.to_string(),
            bot: false,
        }
    }

    fn deleted(content: Option<&str>, actor: Option<UserRef>) -> LogRecord {
        let record = LogRecord::new(
            EventType::MessageDeleted,
            "g1",
            Utc::now(),
            Subject::Message {
                id: "m1".to_string(),
                channel_id: "c1".to_string(),
                author: Some(user("author")),
                content: content.map(str::to_string),
            },
        );
        match actor {
            Some(actor) => record.with_actor(actor),
            None => record,
        }
    }

    fn field_value<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
        payload["embeds"][0]["fields"]
            .as_array()?
            .iter()
            .find(|f| f["name"] == name)?["value"]
            .as_str()
    }

    #[test]
    fn deleted_message_names_correlated_deleter() {
        let payload = render(&deleted(Some("hi"), Some(user("mod"))));
        let embed = &payload["embeds"][0];
        assert_eq!(embed["color"], RED);
        assert_eq!(embed["description"], "A message was deleted in <#c1>");
        assert_eq!(field_value(&payload, "Content"), Some("hi"));
        assert_eq!(field_value(&payload, "Deleter"), Some("mod"));
    }

    #[test]
    fn deleted_message_falls_back_to_author() {
        let payload = render(&deleted(None, None));
        assert_eq!(field_value(&payload, "Content"), Some(NO_CONTENT));
        assert_eq!(field_value(&payload, "Deleter"), Some("author"));
    }

    #[test]
    fn edit_shows_both_contents() {
        let record = LogRecord::new(
            EventType::MessageEdited,
            "g1",
            Utc::now(),
            Subject::Message {
                id: "m1".to_string(),
                channel_id: "c1".to_string(),
                author: Some(user("alice")),
                content: Some("b".to_string()),
            },
        )
        .with_actor(user("alice"))
        .with_states(
            Snapshot::Message(MessageSnapshot {
                content: Some("a".to_string()),
            }),
            Snapshot::Message(MessageSnapshot {
                content: Some("b".to_string()),
            }),
        );
        let payload = render(&record);
        assert_eq!(payload["embeds"][0]["color"], ORANGE);
        assert_eq!(
            payload["embeds"][0]["description"],
            "alice edited a message in <#c1>"
        );
        assert_eq!(field_value(&payload, "Before"), Some("a"));
        assert_eq!(field_value(&payload, "After"), Some("b"));
    }

    #[test]
    fn role_update_lists_only_changed_fields() {
        let snapshot = |name: &str| RoleSnapshot {
            name: name.to_string(),
            color: 0xFF0000,
            permissions: "8".to_string(),
            hoist: false,
            mentionable: false,
        };
        let record = LogRecord::new(
            EventType::RoleUpdated,
            "g1",
            Utc::now(),
            Subject::Role {
                role: RoleRef {
                    id: "r1".to_string(),
                    name: "Moderators".to_string(),
                },
            },
        )
        .with_states(
            Snapshot::Role(snapshot("Mods")),
            Snapshot::Role(snapshot("Moderators")),
        )
        .with_actor(user("admin"));

        let payload = render(&record);
        assert_eq!(field_value(&payload, "Before"), Some("name: Mods"));
        assert_eq!(field_value(&payload, "After"), Some("name: Moderators"));
        assert_eq!(field_value(&payload, "By"), Some("admin"));
    }

    #[test]
    fn creations_are_blue_and_actor_is_optional() {
        let record = LogRecord::new(
            EventType::InviteCreated,
            "g1",
            Utc::now(),
            Subject::Invite {
                code: "abc".to_string(),
                channel_id: None,
            },
        );
        let payload = render(&record);
        assert_eq!(payload["embeds"][0]["color"], BLUE);
        assert_eq!(payload["embeds"][0]["description"], "Invite **abc** was created.");
        assert_eq!(field_value(&payload, "By"), None);
        assert!(payload["embeds"][0].get("footer").is_none());
    }

    #[test]
    fn footer_names_the_subject_user() {
        let payload = render(&deleted(Some("hi"), Some(user("mod"))));
        assert_eq!(
            payload["embeds"][0]["footer"]["text"],
            "User ID: id-author",
            "the footer follows the message author, not the deleter"
        );
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(5000);
        let payload = render(&deleted(Some(&long), None));
        let content = field_value(&payload, "Content").unwrap_or_default();
        assert_eq!(content.chars().count(), FIELD_VALUE_LIMIT);
        assert!(content.ends_with('…'));
    }

    #[test]
    fn every_type_has_a_title() {
        for t in EventType::ALL {
            assert!(!style(t).0.is_empty(), "{t} has no title");
        }
    }
}
