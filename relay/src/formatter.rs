//! Converts one model reply into the platform's multi-message envelope.
//!
//! Model output may embed structured-message documents between fence
//! markers; everything else is plain text, split on blank lines while the
//! running message count stays within the platform cap.

use gembot_line::OutgoingMessage;
use tracing::debug;

/// The platform rejects replies with more than five messages.
pub const MAX_REPLY_MESSAGES: usize = 5;

/// Alt text shown where a Flex message cannot be rendered.
const FLEX_ALT_TEXT: &str = "Interactive Message";

/// Fence delimiter marking the boundary of an embedded block.
const FENCE: &str = "```";

/// Tag identifying a fenced block as a structured-message document.
const JSON_TAG: &str = "json";

/// A region of model output, classified by its position between fence
/// markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text outside any fence.
    Plain(String),
    /// Text between two fence markers, or after an unterminated one.
    Fenced(String),
}

/// Tokenize model output over fence boundaries.
///
/// Regions alternate plain/fenced by position: the text before the first
/// marker is plain, the text after it fenced, and so on. A fence at the
/// very start yields a leading empty plain region, an unterminated fence a
/// trailing fenced region. Empty regions are kept so the parity of the
/// remainder is preserved.
pub fn segment(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = text;
    let mut fenced = false;

    loop {
        match rest.find(FENCE) {
            Some(at) => {
                segments.push(make_segment(fenced, &rest[..at]));
                rest = &rest[at + FENCE.len()..];
                fenced = !fenced;
            }
            None => {
                segments.push(make_segment(fenced, rest));
                break;
            }
        }
    }

    segments
}

fn make_segment(fenced: bool, text: &str) -> Segment {
    if fenced {
        Segment::Fenced(text.to_string())
    } else {
        Segment::Plain(text.to_string())
    }
}

/// Build the reply envelope for one model reply.
///
/// Fenced blocks tagged `json` become Flex messages, degrading to plain
/// text when the document does not parse. Everything else is emitted one
/// message per paragraph unless that would blow the cap, in which case the
/// whole segment collapses into a single message. Emphasis markers (`**`)
/// are stripped from all plain text.
pub fn format_reply(text: &str) -> Vec<OutgoingMessage> {
    let mut messages = Vec::new();

    for seg in segment(text) {
        match seg {
            Segment::Fenced(body) if body.trim().starts_with(JSON_TAG) => {
                let document = &body.trim()[JSON_TAG.len()..];
                match serde_json::from_str::<serde_json::Value>(document) {
                    Ok(contents) => {
                        messages.push(OutgoingMessage::flex(FLEX_ALT_TEXT, contents));
                    }
                    Err(e) => {
                        debug!(error = %e, "Structured block failed to parse, degrading to text");
                        messages.push(OutgoingMessage::text(strip_emphasis(document.trim())));
                    }
                }
            }
            Segment::Fenced(body) | Segment::Plain(body) => {
                append_text_segment(&mut messages, &body);
            }
        }
    }

    // The per-segment collapse keeps the common case within the cap; many
    // segments can still overshoot it, and the platform rejects the whole
    // reply past five messages.
    messages.truncate(MAX_REPLY_MESSAGES);
    messages
}

fn append_text_segment(messages: &mut Vec<OutgoingMessage>, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }

    let paragraphs: Vec<&str> = trimmed
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if messages.len() + paragraphs.len() > MAX_REPLY_MESSAGES {
        // One message per paragraph would blow the cap: collapse the whole
        // segment into a single message instead.
        messages.push(OutgoingMessage::text(strip_emphasis(trimmed)));
    } else {
        for paragraph in paragraphs {
            messages.push(OutgoingMessage::text(strip_emphasis(paragraph)));
        }
    }
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}
