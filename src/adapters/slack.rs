//! Slack payload adapter.
//!
//! Accepts the two payload shapes Slack delivers to the bot:
//! - Events API callbacks (`{"event": {"text", "user", "channel", "ts"}}`),
//!   whose text carries `<@U…>` mention markup
//! - Slash commands (`{"text", "user_id", "channel_id", "response_url"}`)

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Adapter failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The payload text is not JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
    /// The payload matches neither known shape.
    #[error("payload is neither an event callback nor a slash command")]
    UnknownPayload,
    /// A required field is absent or empty.
    #[error("payload is missing required field '{0}'")]
    MissingField(&'static str),
    /// The slash command callback is not a usable URL.
    #[error("invalid response_url: {0}")]
    InvalidResponseUrl(String),
}

/// Where the reply to a query goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyTarget {
    /// Slash command callback URL.
    ResponseUrl {
        /// Callback address.
        url: Url,
    },
    /// Threaded reply under a message.
    Thread {
        /// Channel ID.
        channel: String,
        /// Parent message timestamp.
        ts: String,
    },
    /// Plain post to a channel or DM.
    Channel {
        /// Channel ID.
        channel: String,
    },
}

/// A query ready for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundQuery {
    /// Question text with mention markup removed, trimmed.
    pub text: String,
    /// Slack user ID.
    pub user_id: String,
    /// Slack channel ID.
    pub channel_id: String,
    /// Reply destination.
    pub reply_to: ReplyTarget,
}

#[derive(Debug, Deserialize)]
struct EventCallback {
    event: SlackEvent,
}

#[derive(Debug, Deserialize)]
struct SlackEvent {
    #[serde(default)]
    text: Option<String>,
    user: Option<String>,
    channel: Option<String>,
    ts: Option<String>,
    thread_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlashCommand {
    #[serde(default)]
    text: Option<String>,
    user_id: Option<String>,
    channel_id: Option<String>,
    response_url: Option<String>,
}

/// Remove `<@U123>` / `<@U123|name>` mention markup and trim.
pub fn strip_mentions(text: &str) -> String {
    match Regex::new(r"<@[A-Z0-9]+(?:\|[^>]*)?>") {
        Ok(mention) => mention.replace_all(text, "").trim().to_owned(),
        Err(_) => text.trim().to_owned(),
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AdapterError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(AdapterError::MissingField(field))
}

/// Parse a payload from its JSON text.
///
/// # Errors
///
/// See [`parse_payload`]; also fails on invalid JSON.
pub fn parse_payload_str(raw: &str) -> Result<InboundQuery, AdapterError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| AdapterError::InvalidJson(e.to_string()))?;
    parse_payload(&value)
}

/// Adapt either payload shape into an [`InboundQuery`].
///
/// # Errors
///
/// Returns [`AdapterError`] when the shape is unknown, the user or channel
/// is missing, or the callback URL does not parse.
pub fn parse_payload(value: &Value) -> Result<InboundQuery, AdapterError> {
    if value.get("event").is_some() {
        let callback: EventCallback = serde_json::from_value(value.clone())
            .map_err(|e| AdapterError::InvalidJson(e.to_string()))?;
        return from_event(callback.event);
    }
    if value.get("text").is_some() || value.get("response_url").is_some() {
        let command: SlashCommand = serde_json::from_value(value.clone())
            .map_err(|e| AdapterError::InvalidJson(e.to_string()))?;
        return from_command(command);
    }
    Err(AdapterError::UnknownPayload)
}

fn from_event(event: SlackEvent) -> Result<InboundQuery, AdapterError> {
    let user_id = required(event.user, "event.user")?;
    let channel_id = required(event.channel, "event.channel")?;
    let reply_to = match event.thread_ts.or(event.ts) {
        Some(ts) if !ts.is_empty() => ReplyTarget::Thread {
            channel: channel_id.clone(),
            ts,
        },
        _ => ReplyTarget::Channel {
            channel: channel_id.clone(),
        },
    };
    Ok(InboundQuery {
        text: strip_mentions(event.text.as_deref().unwrap_or_default()),
        user_id,
        channel_id,
        reply_to,
    })
}

fn from_command(command: SlashCommand) -> Result<InboundQuery, AdapterError> {
    let user_id = required(command.user_id, "user_id")?;
    let channel_id = required(command.channel_id, "channel_id")?;
    let reply_to = match command.response_url.filter(|u| !u.trim().is_empty()) {
        Some(raw) => ReplyTarget::ResponseUrl {
            url: Url::parse(&raw).map_err(|e| AdapterError::InvalidResponseUrl(e.to_string()))?,
        },
        None => ReplyTarget::Channel {
            channel: channel_id.clone(),
        },
    };
    Ok(InboundQuery {
        text: command.text.unwrap_or_default().trim().to_owned(),
        user_id,
        channel_id,
        reply_to,
    })
}
