//! Routes inbound webhook events to their handlers.
//!
//! Stateless across events: each handler resolves what it needs, runs the
//! gateway/reply pipeline once, and drops the single-use reply token
//! whether or not delivery succeeds.

use std::sync::Arc;

use gembot_line::{ContentProvider, LineClient, MessageContent, OutgoingMessage, WebhookEvent};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::formatter;
use crate::gateway::{AiGateway, ImageAttachment};
use crate::profile::{ProfileResolver, UserProfile};

/// Fixed reply when a media file exceeds the configured ceiling.
const OVERSIZE_REPLY: &str = "Sorry, the file is too large to process.";

/// Fixed reply for media types the relay cannot analyze.
const UNSUPPORTED_MEDIA_REPLY: &str = "I can only process image files at the moment.";

/// Fixed reply when the media bytes cannot be fetched at all.
const FETCH_FAILED_REPLY: &str = "Sorry, I couldn't retrieve that file.";

/// Substituted when formatting a reply yields no messages; the platform
/// rejects an empty reply envelope.
const EMPTY_REPLY_FALLBACK: &str = "I don't have a reply for that, sorry.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Image,
    Video,
    Audio,
}

/// Stateless router from webhook events to the gateway / reply pipeline.
#[derive(Clone)]
pub struct EventDispatcher {
    config: Arc<AppConfig>,
    line: Arc<LineClient>,
    http: reqwest::Client,
    gateway: AiGateway,
    profiles: ProfileResolver,
}

impl EventDispatcher {
    pub fn new(
        config: Arc<AppConfig>,
        line: Arc<LineClient>,
        gateway: AiGateway,
        profiles: ProfileResolver,
    ) -> Self {
        Self {
            config,
            line,
            http: reqwest::Client::new(),
            gateway,
            profiles,
        }
    }

    /// Handle one webhook event to completion.
    pub async fn dispatch(&self, event: WebhookEvent) {
        match event {
            WebhookEvent::Follow {
                reply_token,
                source,
                follow,
            } => {
                let Some(user_id) = source.user_id else {
                    warn!("Follow event without a user id, ignoring");
                    return;
                };
                let is_unblocked = follow.map(|f| f.is_unblocked).unwrap_or(false);
                self.handle_follow(&reply_token, &user_id, is_unblocked).await;
            }
            WebhookEvent::Message {
                reply_token,
                source,
                message,
            } => {
                let Some(user_id) = source.user_id else {
                    warn!("Message event without a user id, ignoring");
                    return;
                };
                match message {
                    MessageContent::Text { text, .. } => {
                        self.handle_text(&reply_token, &user_id, &text).await;
                    }
                    MessageContent::Image {
                        id,
                        content_provider,
                    } => {
                        self.handle_media(&reply_token, &user_id, MediaKind::Image, &id, content_provider)
                            .await;
                    }
                    MessageContent::Video {
                        id,
                        content_provider,
                    } => {
                        self.handle_media(&reply_token, &user_id, MediaKind::Video, &id, content_provider)
                            .await;
                    }
                    MessageContent::Audio {
                        id,
                        content_provider,
                    } => {
                        self.handle_media(&reply_token, &user_id, MediaKind::Audio, &id, content_provider)
                            .await;
                    }
                    MessageContent::Other => {
                        debug!(user_id = %user_id, "Unhandled message type, ignoring");
                    }
                }
            }
            WebhookEvent::Other => {
                debug!("Unhandled event type, ignoring");
            }
        }
    }

    async fn handle_follow(&self, reply_token: &str, user_id: &str, is_unblocked: bool) {
        info!(user_id = %user_id, is_unblocked, "Handling follow event");

        let profile = self.resolve_profile(user_id).await;

        let reply = match self.config.canned_messages.get(&profile.language) {
            Some(templates) => {
                let template = if is_unblocked {
                    &templates.unblock
                } else {
                    &templates.follow
                };
                render_template(template, &profile.display_name)
            }
            None => {
                let instruction = welcome_instruction(&profile, is_unblocked);
                self.gateway.query(user_id, &instruction, None).await
            }
        };

        self.send_reply(reply_token, &reply).await;
    }

    async fn handle_text(&self, reply_token: &str, user_id: &str, text: &str) {
        info!(user_id = %user_id, "Handling text message");

        let reply = self.gateway.query(user_id, text, None).await;
        self.send_reply(reply_token, &reply).await;
    }

    async fn handle_media(
        &self,
        reply_token: &str,
        user_id: &str,
        kind: MediaKind,
        message_id: &str,
        provider: ContentProvider,
    ) {
        info!(user_id = %user_id, kind = ?kind, "Handling media message");

        let profile = self.resolve_profile(user_id).await;

        let bytes = match self.fetch_media(message_id, provider).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to fetch media content");
                self.send_reply(reply_token, FETCH_FAILED_REPLY).await;
                return;
            }
        };

        if bytes.len() > self.config.max_file_size {
            info!(user_id = %user_id, size = bytes.len(), "Media exceeds the size ceiling");
            self.send_reply(reply_token, OVERSIZE_REPLY).await;
            return;
        }

        if kind != MediaKind::Image {
            self.send_reply(reply_token, UNSUPPORTED_MEDIA_REPLY).await;
            return;
        }

        let prompt = image_prompt(&profile);
        let attachment = ImageAttachment {
            mime_type: "image/jpeg".to_string(),
            bytes,
        };
        let reply = self.gateway.query(user_id, &prompt, Some(attachment)).await;
        self.send_reply(reply_token, &reply).await;
    }

    /// Fetch media bytes from wherever the platform says they live.
    async fn fetch_media(
        &self,
        message_id: &str,
        provider: ContentProvider,
    ) -> anyhow::Result<Vec<u8>> {
        match provider {
            ContentProvider::External {
                original_content_url,
                ..
            } => {
                let response = self.http.get(&original_content_url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    anyhow::bail!("External content fetch returned {}", status);
                }
                Ok(response.bytes().await?.to_vec())
            }
            ContentProvider::Line => Ok(self.line.get_message_content(message_id).await?),
        }
    }

    async fn resolve_profile(&self, user_id: &str) -> UserProfile {
        match self.profiles.resolve(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile lookup failed, using defaults");
                UserProfile::fallback()
            }
        }
    }

    /// Format a reply into the envelope and send it. The reply token is
    /// single-use, so delivery failures are logged and dropped, never
    /// retried.
    async fn send_reply(&self, reply_token: &str, text: &str) {
        let mut messages = formatter::format_reply(text);
        if messages.is_empty() {
            warn!("Formatted reply is empty, substituting fallback message");
            messages.push(OutgoingMessage::text(EMPTY_REPLY_FALLBACK));
        }

        if let Err(e) = self.line.reply(reply_token, messages).await {
            error!(error = %e, "Failed to deliver reply");
        }
    }
}

/// Interpolate the `{user_name}` placeholder of a canned template.
fn render_template(template: &str, user_name: &str) -> String {
    template.replace("{user_name}", user_name)
}

/// Instruction handed to the model when no canned template covers the
/// user's language.
fn welcome_instruction(profile: &UserProfile, is_unblocked: bool) -> String {
    if is_unblocked {
        format!(
            "Generate a personalized welcome back message for user {}. \
             If possible, respond in their language (detected: {}).",
            profile.display_name, profile.language
        )
    } else {
        format!(
            "Generate a personalized welcome message for new user {}. \
             If possible, respond in their language (detected: {}).",
            profile.display_name, profile.language
        )
    }
}

fn image_prompt(profile: &UserProfile) -> String {
    format!(
        "User: {}, Language: {}. Please analyze this image and provide relevant information. \
         If possible, respond in the user's language.",
        profile.display_name, profile.language
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, language: &str) -> UserProfile {
        UserProfile {
            display_name: name.to_string(),
            language: language.to_string(),
        }
    }

    #[test]
    fn render_template_substitutes_the_user_name() {
        assert_eq!(
            render_template("Welcome back, {user_name}!", "Alice"),
            "Welcome back, Alice!"
        );
    }

    #[test]
    fn render_template_without_placeholder_is_unchanged() {
        assert_eq!(render_template("Hello there!", "Alice"), "Hello there!");
    }

    #[test]
    fn welcome_instruction_selects_the_unblock_variant() {
        let profile = profile("Bob", "fr");

        let follow = welcome_instruction(&profile, false);
        let unblock = welcome_instruction(&profile, true);

        assert!(follow.contains("welcome message for new user Bob"));
        assert!(unblock.contains("welcome back message for user Bob"));
        assert!(follow.contains("fr"));
    }

    #[test]
    fn image_prompt_embeds_name_and_language() {
        let prompt = image_prompt(&profile("Carol", "ko"));

        assert!(prompt.contains("Carol"));
        assert!(prompt.contains("ko"));
        assert!(prompt.contains("analyze this image"));
    }
}
