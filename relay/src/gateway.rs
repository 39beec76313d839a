//! The bridge between inbound messages and the Gemini backend.
//!
//! Replays the user's bounded history in front of every query and records
//! the exchange afterwards. A failed model call never surfaces as an error:
//! the caller gets a fixed fallback string and the stored history is left
//! exactly as it was.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use gembot_core::{Content, GeminiClient, Part};
use tracing::{error, warn};

use crate::context::{ContextStore, ConversationTurn, Role, TurnPart};
use crate::profile::{ProfileResolver, UserProfile};

/// Fixed reply used whenever the model call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't understand your message.";

/// An inline image accompanying a query. Every image carries a caption
/// prompt; image-only queries are not representable.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Sends conversations to Gemini and maintains the per-user context.
#[derive(Debug, Clone)]
pub struct AiGateway {
    client: Arc<GeminiClient>,
    store: ContextStore,
    profiles: ProfileResolver,
}

impl AiGateway {
    pub fn new(client: Arc<GeminiClient>, store: ContextStore, profiles: ProfileResolver) -> Self {
        Self {
            client,
            store,
            profiles,
        }
    }

    /// Query the model with the user's history replayed in front of the new
    /// turn. Always returns a usable reply string; on failure the stored
    /// history is untouched and the fixed fallback is returned.
    pub async fn query(
        &self,
        user_id: &str,
        message: &str,
        image: Option<ImageAttachment>,
    ) -> String {
        let profile = match self.profiles.resolve(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile lookup failed, using defaults");
                UserProfile::fallback()
            }
        };

        let mut history = self.store.load(user_id).await;
        let contents = build_contents(&profile, &history, message, image.as_ref());

        let reply = match self.client.generate(contents).await {
            Ok(text) => text,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Model call failed");
                return FALLBACK_REPLY.to_string();
            }
        };

        // Only a successful exchange is recorded.
        let now = Utc::now().timestamp();
        history.push(user_turn(message, image, now));
        history.push(ConversationTurn::text(Role::Model, reply.clone(), now));
        self.store.save(user_id, history).await;

        reply
    }
}

/// Assemble the model payload: profile preamble, replayed history, new
/// turn.
fn build_contents(
    profile: &UserProfile,
    history: &[ConversationTurn],
    message: &str,
    image: Option<&ImageAttachment>,
) -> Vec<Content> {
    let mut contents = Vec::with_capacity(history.len() + 2);

    contents.push(Content {
        parts: vec![Part::text(format!(
            "User: {}, Language: {}. Please respond in the user's language if possible.",
            profile.display_name, profile.language
        ))],
        role: Some("user".to_string()),
    });

    contents.extend(history.iter().map(turn_to_content));

    let mut parts = Vec::new();
    if let Some(image) = image {
        parts.push(Part::inline_data(image.mime_type.clone(), &image.bytes));
    }
    parts.push(Part::text(message.to_string()));
    contents.push(Content {
        parts,
        role: Some("user".to_string()),
    });

    contents
}

fn turn_to_content(turn: &ConversationTurn) -> Content {
    Content {
        parts: turn
            .parts
            .iter()
            .map(|part| match part {
                TurnPart::Text(text) => Part::text(text.clone()),
                TurnPart::InlineData { mime_type, data } => {
                    Part::inline_base64(mime_type.clone(), data.clone())
                }
            })
            .collect(),
        role: Some(turn.role.as_str().to_string()),
    }
}

/// The turn recorded for the user's side of the exchange. An image rides
/// along as an inline-data fragment ahead of its caption.
fn user_turn(message: &str, image: Option<ImageAttachment>, timestamp: i64) -> ConversationTurn {
    let mut parts = Vec::new();
    if let Some(image) = image {
        parts.push(TurnPart::InlineData {
            mime_type: image.mime_type,
            data: BASE64.encode(&image.bytes),
        });
    }
    parts.push(TurnPart::Text(message.to_string()));

    ConversationTurn {
        role: Role::User,
        parts,
        timestamp,
    }
}
