//! Discord REST adapter for the collaborator traits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modlog_types::{AuditActionKind, UserRef};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::platform::{AuditEntry, AuditQuery, ChannelHandle, DestinationSender, PlatformError};

/// Default REST base URL.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Milliseconds between the Unix epoch and the platform's id epoch.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// A bot-token authenticated REST client.
#[derive(Debug, Clone)]
pub struct DiscordRest {
    client: Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct AuditLogResponse {
    #[serde(default)]
    audit_log_entries: Vec<RawAuditEntry>,
    #[serde(default)]
    users: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawAuditEntry {
    id: String,
    action_type: u16,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    target_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    username: String,
    #[serde(default)]
    discriminator: Option<String>,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct RawChannelInfo {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    guild_id: Option<String>,
}

impl DiscordRest {
    /// Build a client with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Http` if the TLS backend cannot be
    /// initialised.
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }
}

/// Creation time encoded in a platform id.
pub fn snowflake_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let raw: u64 = id.parse().ok()?;
    let ms = (raw >> 22) + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(i64::try_from(ms).ok()?)
}

/// Display tag for a user: bare username on the current naming scheme,
/// `name#1234` for legacy accounts.
pub fn user_tag(username: &str, discriminator: Option<&str>) -> String {
    match discriminator {
        Some(d) if !d.is_empty() && d != "0" => format!("{username}#{d}"),
        _ => username.to_string(),
    }
}

fn first_entry(body: AuditLogResponse) -> Result<Option<AuditEntry>, PlatformError> {
    let Some(raw) = body.audit_log_entries.into_iter().next() else {
        return Ok(None);
    };
    let kind = AuditActionKind::from_code(raw.action_type)
        .ok_or_else(|| PlatformError::Decode(format!("unknown audit action {}", raw.action_type)))?;
    let created_at = snowflake_timestamp(&raw.id)
        .ok_or_else(|| PlatformError::Decode(format!("invalid audit entry id {}", raw.id)))?;
    let executor = raw.user_id.as_deref().and_then(|uid| {
        body.users.iter().find(|u| u.id == uid).map(|u| UserRef {
            id: u.id.clone(),
            tag: user_tag(&u.username, u.discriminator.as_deref()),
            bot: u.bot,
        })
    });
    Ok(Some(AuditEntry {
        id: raw.id,
        kind,
        executor,
        target_id: raw.target_id,
        created_at,
    }))
}

async fn check(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    Err(PlatformError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AuditQuery for DiscordRest {
    async fn latest_entry(
        &self,
        guild_id: &str,
        kind: AuditActionKind,
    ) -> Result<Option<AuditEntry>, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("/guilds/{guild_id}/audit-logs")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .query(&[("action_type", kind.code().to_string()), ("limit", "1".to_string())])
            .send()
            .await?;
        let body: AuditLogResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        first_entry(body)
    }
}

#[async_trait]
impl DestinationSender for DiscordRest {
    async fn resolve_channel(&self, channel_id: &str) -> Result<ChannelHandle, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("/channels/{channel_id}")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .await?;
        let info: RawChannelInfo = check(response)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        Ok(ChannelHandle {
            id: info.id,
            name: info.name,
            guild_id: info.guild_id,
        })
    }

    async fn send(&self, channel: &ChannelHandle, payload: &Value) -> Result<(), PlatformError> {
        let response = self
            .client
            .post(self.url(&format!("/channels/{}/messages", channel.id)))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(payload)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_decodes_creation_time() {
        // 175928847299117063 is the example id from the platform docs.
        let ts = snowflake_timestamp("175928847299117063").expect("valid id");
        assert_eq!(ts.timestamp_millis(), 1_462_015_105_796);
        assert!(snowflake_timestamp("not-a-number").is_none());
    }

    #[test]
    fn tags_follow_naming_scheme() {
        assert_eq!(user_tag("alice", Some("0")), "alice");
        assert_eq!(user_tag("alice", None), "alice");
        assert_eq!(user_tag("bob", Some("1234")), "bob#1234");
    }

    #[test]
    fn first_entry_joins_executor() {
        let body: AuditLogResponse = serde_json::from_value(serde_json::json!({
            "audit_log_entries": [{
                "id": "175928847299117063",
                "action_type": 72,
                "user_id": "u1",
                "target_id": "author"
            }],
            "users": [{"id": "u1", "username": "mod", "discriminator": "0"}]
        }))
        .expect("should parse");

        let entry = first_entry(body).expect("decodes").expect("has entry");
        assert_eq!(entry.kind, AuditActionKind::MessageDelete);
        assert_eq!(entry.executor.map(|u| u.tag), Some("mod".to_string()));
        assert_eq!(entry.target_id.as_deref(), Some("author"));
    }

    #[test]
    fn empty_trail_is_none() {
        let body: AuditLogResponse =
            serde_json::from_value(serde_json::json!({"audit_log_entries": []})).expect("parse");
        assert!(first_entry(body).expect("decodes").is_none());
    }

    #[test]
    fn base_url_is_normalised() {
        let rest = DiscordRest::new("http://localhost:9/api/", "t", Duration::from_secs(1))
            .expect("client builds");
        assert_eq!(rest.url("/channels/1"), "http://localhost:9/api/channels/1");
        assert_eq!(rest.auth(), "Bot t");
    }
}
