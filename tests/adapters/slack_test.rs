//! Slack payload adaptation.

use serde_json::json;
use trendscope::adapters::slack::{
    parse_payload, parse_payload_str, strip_mentions, AdapterError, ReplyTarget,
};

#[test]
fn event_mention_replies_in_thread() {
    let payload = json!({
        "type": "event_callback",
        "event": {
            "type": "app_mention",
            "text": "<@U07BOT123> how big is Clair Obscur's fandom?",
            "user": "U123",
            "channel": "C456",
            "ts": "1718000000.000100"
        }
    });
    let query = parse_payload(&payload).expect("event payload should adapt");
    assert_eq!(query.text, "how big is Clair Obscur's fandom?");
    assert_eq!(query.user_id, "U123");
    assert_eq!(query.channel_id, "C456");
    assert_eq!(
        query.reply_to,
        ReplyTarget::Thread {
            channel: "C456".to_owned(),
            ts: "1718000000.000100".to_owned(),
        }
    );
}

#[test]
fn existing_thread_is_preferred_over_message_ts() {
    let payload = json!({
        "event": {
            "text": "Warframe vs Crusader Kings",
            "user": "U123",
            "channel": "C456",
            "ts": "1718000000.000200",
            "thread_ts": "1718000000.000100"
        }
    });
    let query = parse_payload(&payload).expect("event payload should adapt");
    assert!(matches!(
        query.reply_to,
        ReplyTarget::Thread { ref ts, .. } if ts == "1718000000.000100"
    ));
}

#[test]
fn event_without_timestamp_posts_to_channel() {
    let payload = json!({
        "event": {"text": "news", "user": "U1", "channel": "D9"}
    });
    let query = parse_payload(&payload).expect("event payload should adapt");
    assert_eq!(
        query.reply_to,
        ReplyTarget::Channel {
            channel: "D9".to_owned()
        }
    );
}

#[test]
fn event_without_text_is_empty_query() {
    let payload = json!({"event": {"user": "U1", "channel": "C1", "ts": "1.2"}});
    let query = parse_payload(&payload).expect("event payload should adapt");
    assert_eq!(query.text, "");
}

#[test]
fn slash_command_replies_to_response_url() {
    let payload = json!({
        "command": "/trends",
        "text": "  top anime in the us ",
        "user_id": "U123",
        "channel_id": "C456",
        "response_url": "https://hooks.slack.com/commands/T1/123/abc"
    });
    let query = parse_payload(&payload).expect("slash command should adapt");
    assert_eq!(query.text, "top anime in the us");
    match query.reply_to {
        ReplyTarget::ResponseUrl { url } => {
            assert_eq!(url.host_str(), Some("hooks.slack.com"));
        }
        other => panic!("expected response url, got {other:?}"),
    }
}

#[test]
fn slash_command_without_response_url_posts_to_channel() {
    let payload = json!({"text": "hades", "user_id": "U1", "channel_id": "C1"});
    let query = parse_payload(&payload).expect("slash command should adapt");
    assert_eq!(
        query.reply_to,
        ReplyTarget::Channel {
            channel: "C1".to_owned()
        }
    );
}

#[test]
fn missing_fields_are_reported() {
    let payload = json!({"event": {"text": "hi", "channel": "C1"}});
    assert_eq!(
        parse_payload(&payload),
        Err(AdapterError::MissingField("event.user"))
    );

    let payload = json!({"text": "hi", "user_id": "U1", "channel_id": ""});
    assert_eq!(
        parse_payload(&payload),
        Err(AdapterError::MissingField("channel_id"))
    );
}

#[test]
fn invalid_response_url_is_rejected() {
    let payload = json!({
        "text": "hi",
        "user_id": "U1",
        "channel_id": "C1",
        "response_url": "not a url"
    });
    assert!(matches!(
        parse_payload(&payload),
        Err(AdapterError::InvalidResponseUrl(_))
    ));
}

#[test]
fn unknown_shapes_are_rejected() {
    assert_eq!(
        parse_payload(&json!({"type": "url_verification", "challenge": "x"})),
        Err(AdapterError::UnknownPayload)
    );
    assert!(matches!(
        parse_payload_str("{not json"),
        Err(AdapterError::InvalidJson(_))
    ));
}

#[test]
fn mention_markup_is_removed() {
    assert_eq!(strip_mentions("<@U1> <@U2|bot> hello "), "hello");
    assert_eq!(strip_mentions("no mentions"), "no mentions");
}
