use serde::Deserialize;

/// Webhook request body: a batch of events delivered to one bot.
#[derive(Deserialize, Debug)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One inbound webhook event.
///
/// Only the event types the relay reacts to are modelled; everything else
/// (unfollow, join, sticker, ...) lands in `Other` and is ignored upstream.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    /// The user added the bot as a friend, or unblocked it.
    #[serde(rename_all = "camelCase")]
    Follow {
        reply_token: String,
        source: EventSource,
        #[serde(default)]
        follow: Option<FollowDetail>,
    },
    /// The user sent a message.
    #[serde(rename_all = "camelCase")]
    Message {
        reply_token: String,
        source: EventSource,
        message: MessageContent,
    },
    #[serde(other)]
    Other,
}

/// Extra detail on a follow event.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FollowDetail {
    #[serde(default)]
    pub is_unblocked: bool,
}

/// Where an event came from.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// The message attached to a message event.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text {
        id: String,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        id: String,
        content_provider: ContentProvider,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        id: String,
        content_provider: ContentProvider,
    },
    #[serde(rename_all = "camelCase")]
    Audio {
        id: String,
        content_provider: ContentProvider,
    },
    #[serde(other)]
    Other,
}

/// Who hosts the binary content of a media message.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentProvider {
    /// Stored by the platform; fetched through the message-content endpoint.
    Line,
    /// Hosted elsewhere; fetched directly from the given URL.
    #[serde(rename_all = "camelCase")]
    External {
        original_content_url: String,
        #[serde(default)]
        preview_image_url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_message_event() {
        let raw = r#"{
            "destination": "U0000",
            "events": [{
                "type": "message",
                "replyToken": "token-1",
                "source": { "type": "user", "userId": "U123" },
                "timestamp": 1700000000000,
                "mode": "active",
                "message": { "type": "text", "id": "m1", "text": "hello" }
            }]
        }"#;

        let payload: WebhookPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.events.len(), 1);
        match &payload.events[0] {
            WebhookEvent::Message {
                reply_token,
                source,
                message: MessageContent::Text { text, .. },
            } => {
                assert_eq!(reply_token, "token-1");
                assert_eq!(source.user_id.as_deref(), Some("U123"));
                assert_eq!(text, "hello");
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_follow_event_with_unblock_flag() {
        let raw = r#"{
            "type": "follow",
            "replyToken": "token-2",
            "source": { "type": "user", "userId": "U456" },
            "follow": { "isUnblocked": true }
        }"#;

        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        match event {
            WebhookEvent::Follow { follow, .. } => {
                assert!(follow.unwrap().is_unblocked);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_image_message_with_external_provider() {
        let raw = r#"{
            "type": "message",
            "replyToken": "token-3",
            "source": { "type": "user", "userId": "U789" },
            "message": {
                "type": "image",
                "id": "m2",
                "contentProvider": {
                    "type": "external",
                    "originalContentUrl": "https://example.com/a.jpg"
                }
            }
        }"#;

        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        match event {
            WebhookEvent::Message {
                message:
                    MessageContent::Image {
                        content_provider:
                            ContentProvider::External {
                                original_content_url,
                                ..
                            },
                        ..
                    },
                ..
            } => {
                assert_eq!(original_content_url, "https://example.com/a.jpg");
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_event_type_maps_to_other() {
        let raw = r#"{ "type": "unfollow", "source": { "type": "user", "userId": "U1" } }"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();

        assert!(matches!(event, WebhookEvent::Other));
    }

    #[test]
    fn unknown_message_type_maps_to_other() {
        let raw = r#"{
            "type": "message",
            "replyToken": "token-4",
            "source": { "type": "user", "userId": "U1" },
            "message": { "type": "sticker", "id": "m3", "stickerId": "s1" }
        }"#;

        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        match event {
            WebhookEvent::Message { message, .. } => {
                assert!(matches!(message, MessageContent::Other));
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }
}
