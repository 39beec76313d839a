use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outgoing message inside a reply envelope.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingMessage {
    /// Plain text message
    Text { text: String },
    /// Flex message: a platform-native interactive layout described by a
    /// JSON container document
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: Value,
    },
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn flex(alt_text: impl Into<String>, contents: Value) -> Self {
        Self::Flex {
            alt_text: alt_text.into(),
            contents,
        }
    }
}

/// Reply request envelope, bound to a one-time reply token.
#[derive(Serialize, Debug)]
pub struct ReplyRequest {
    #[serde(rename = "replyToken")]
    pub reply_token: String,
    pub messages: Vec<OutgoingMessage>,
}

/// User profile returned by the profile endpoint.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub user_id: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_serializes_with_type_tag() {
        let message = OutgoingMessage::text("hello");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json, serde_json::json!({ "type": "text", "text": "hello" }));
    }

    #[test]
    fn flex_message_serializes_with_alt_text() {
        let contents = serde_json::json!({ "type": "bubble" });
        let message = OutgoingMessage::flex("Interactive Message", contents.clone());
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "flex",
                "altText": "Interactive Message",
                "contents": contents,
            })
        );
    }

    #[test]
    fn profile_parses_with_missing_optional_fields() {
        let raw = r#"{ "displayName": "Alice", "userId": "U123" }"#;
        let profile: Profile = serde_json::from_str(raw).unwrap();

        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.language, None);
    }
}
