//! Mapping from raw notifications to log records.
//!
//! One notification yields zero or more records:
//!
//! - zero when the notification is outside a community, comes from a bot
//!   (reactions and voice only), or is an update whose reported attributes
//!   did not change;
//! - one for almost everything else;
//! - one per role added plus one per role removed for a member update.
//!
//! Records leave here with an actor only when the payload itself names one
//! (the editing author, the reacting user, the member changing voice
//! channel). Everything else is left for the correlator.

use chrono::{DateTime, Utc};
use modlog_types::{EventType, LogRecord, MessageSnapshot, RoleRef, Snapshot, Subject, UserRef};

use crate::raw::{RawChannel, RawEvent, RawMessage, RawRole};

/// The records produced from one raw notification.
///
/// A finite, single-pass sequence; each element is dispatched on its own.
#[derive(Debug)]
pub struct Records(std::vec::IntoIter<LogRecord>);

impl Iterator for Records {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Records {}

impl From<Vec<LogRecord>> for Records {
    fn from(records: Vec<LogRecord>) -> Self {
        Self(records.into_iter())
    }
}

/// Normalizes one notification observed at `now`.
pub fn normalize(event: RawEvent, now: DateTime<Utc>) -> Records {
    let Some(guild_id) = event.guild_id().map(str::to_string) else {
        return Records::from(Vec::new());
    };
    let at = |event_type, subject| LogRecord::new(event_type, guild_id.clone(), now, subject);

    let records = match event {
        RawEvent::MessageDelete { message, .. } => {
            vec![at(EventType::MessageDeleted, message_subject(message))]
        }
        RawEvent::MessageUpdate { before, after, .. } => {
            // Attachment- and embed-only edits leave content untouched.
            if before.content == after.content {
                return Records::from(Vec::new());
            }
            let before_state = Snapshot::Message(MessageSnapshot {
                content: before.content,
            });
            let after_state = Snapshot::Message(MessageSnapshot {
                content: after.content.clone(),
            });
            let author = after.author.clone().or(before.author);
            let mut record = at(EventType::MessageEdited, message_subject(after))
                .with_states(before_state, after_state);
            record.actor = author;
            vec![record]
        }
        RawEvent::MemberAdd { user, .. } => vec![at(EventType::UserJoined, Subject::Member { user })],
        RawEvent::MemberRemove { user, .. } => vec![at(EventType::UserLeft, Subject::Member { user })],
        RawEvent::MemberUpdate {
            user,
            before_roles,
            after_roles,
            ..
        } => role_diff(&before_roles, &after_roles)
            .map(|(event_type, role)| {
                at(
                    event_type,
                    Subject::MemberRole {
                        user: user.clone(),
                        role,
                    },
                )
            })
            .collect(),
        RawEvent::RoleCreate { role, .. } => vec![at(EventType::RoleCreated, role_subject(&role))],
        RawEvent::RoleDelete { role, .. } => vec![at(EventType::RoleDeleted, role_subject(&role))],
        RawEvent::RoleUpdate { before, after, .. } => {
            let (b, a) = (before.snapshot(), after.snapshot());
            if b == a {
                return Records::from(Vec::new());
            }
            vec![at(EventType::RoleUpdated, role_subject(&after))
                .with_states(Snapshot::Role(b), Snapshot::Role(a))]
        }
        RawEvent::ChannelCreate { channel, .. } => {
            vec![at(EventType::ChannelCreated, channel_subject(&channel))]
        }
        RawEvent::ChannelDelete { channel, .. } => {
            vec![at(EventType::ChannelDeleted, channel_subject(&channel))]
        }
        RawEvent::ChannelUpdate { before, after, .. } => {
            let (b, a) = (before.snapshot(), after.snapshot());
            if b == a {
                return Records::from(Vec::new());
            }
            vec![at(EventType::ChannelUpdated, channel_subject(&after))
                .with_states(Snapshot::Channel(b), Snapshot::Channel(a))]
        }
        RawEvent::InviteCreate { invite, .. } => vec![at(
            EventType::InviteCreated,
            Subject::Invite {
                code: invite.code,
                channel_id: invite.channel_id,
            },
        )],
        RawEvent::InviteDelete { invite, .. } => vec![at(
            EventType::InviteDeleted,
            Subject::Invite {
                code: invite.code,
                channel_id: invite.channel_id,
            },
        )],
        RawEvent::ReactionAdd { reaction, .. } => {
            if reaction.user.bot {
                return Records::from(Vec::new());
            }
            let actor = reaction.user.clone();
            vec![at(
                EventType::ReactionAdded,
                Subject::Reaction {
                    message_id: reaction.message_id,
                    channel_id: reaction.channel_id,
                    emoji: reaction.emoji,
                    user: reaction.user,
                },
            )
            .with_actor(actor)]
        }
        RawEvent::ReactionRemove { reaction, .. } => {
            if reaction.user.bot {
                return Records::from(Vec::new());
            }
            // The remover may be a moderator; the payload does not say.
            vec![at(
                EventType::ReactionRemoved,
                Subject::Reaction {
                    message_id: reaction.message_id,
                    channel_id: reaction.channel_id,
                    emoji: reaction.emoji,
                    user: reaction.user,
                },
            )]
        }
        RawEvent::VoiceStateUpdate {
            user,
            before,
            after,
            ..
        } => {
            if user.bot {
                return Records::from(Vec::new());
            }
            let event_type = match (&before, &after) {
                (None, Some(_)) => EventType::VcJoined,
                (Some(_), None) => EventType::VcLeft,
                (Some(from), Some(to)) if from.id != to.id => EventType::VcMoved,
                // Mute, deafen, stream and same-channel updates.
                _ => return Records::from(Vec::new()),
            };
            let actor = user.clone();
            vec![at(
                event_type,
                Subject::Voice {
                    user,
                    from: before,
                    to: after,
                },
            )
            .with_actor(actor)]
        }
    };

    Records::from(records)
}

fn message_subject(message: RawMessage) -> Subject {
    Subject::Message {
        id: message.id,
        channel_id: message.channel_id,
        author: message.author,
        content: message.content,
    }
}

fn role_subject(role: &RawRole) -> Subject {
    Subject::Role {
        role: role.to_ref(),
    }
}

fn channel_subject(channel: &RawChannel) -> Subject {
    Subject::Channel {
        channel: channel.to_ref(),
    }
}

/// Roles present only after (given) followed by roles present only before
/// (taken), compared by id.
fn role_diff<'a>(
    before: &'a [RoleRef],
    after: &'a [RoleRef],
) -> impl Iterator<Item = (EventType, RoleRef)> + 'a {
    let given = after
        .iter()
        .filter(|r| !before.iter().any(|b| b.id == r.id))
        .map(|r| (EventType::RoleGiven, r.clone()));
    let taken = before
        .iter()
        .filter(|r| !after.iter().any(|a| a.id == r.id))
        .map(|r| (EventType::RoleTaken, r.clone()));
    given.chain(taken)
}

/// The user a record is about, independent of who caused it.
pub(crate) fn subject_user(subject: &Subject) -> Option<&UserRef> {
    match subject {
        Subject::Message { author, .. } => author.as_ref(),
        Subject::Reaction { user, .. }
        | Subject::Member { user }
        | Subject::MemberRole { user, .. }
        | Subject::Voice { user, .. } => Some(user),
        Subject::Role { .. } | Subject::Channel { .. } | Subject::Invite { .. } => None,
    }
}
