use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Helper struct to encapsulate model details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GeminiModel {
    pub api_key: String,
    pub model_name: String,
}

impl GeminiModel {
    pub fn new(api_key: String, model_name: Option<String>) -> Self {
        Self {
            api_key,
            model_name: model_name.unwrap_or_else(|| "gemini-2.0-flash".to_string()),
        }
    }
}

/// Request to Gemini API to generate content
#[derive(Serialize, Debug)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content structure for requests and responses
#[derive(Serialize, Clone, Debug, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Part structure for a piece of content
#[derive(Serialize, Clone, Debug, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// Inline binary payload, carried base64-encoded on the wire
#[derive(Serialize, Clone, Debug, Deserialize)]
pub struct Blob {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

impl Part {
    pub fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    /// Build an inline-data part from raw bytes.
    pub fn inline_data(mime_type: String, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type,
                data: BASE64.encode(bytes),
            }),
        }
    }

    /// Build an inline-data part from an already base64-encoded payload.
    pub fn inline_base64(mime_type: String, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob { mime_type, data }),
        }
    }
}

/// Generation configuration options
#[derive(Serialize, Debug, Default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i32>,
}

/// Response from Gemini API
#[derive(Deserialize, Debug, Serialize)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
}

/// Candidate in the response
#[derive(Deserialize, Debug, Serialize)]
pub struct Candidate {
    pub content: Option<ContentResponsePart>,
}

/// Content part in the response
#[derive(Deserialize, Debug, Serialize)]
pub struct ContentResponsePart {
    pub parts: Vec<PartResponse>,
    pub role: Option<String>,
}

/// Part response from the API
#[derive(Deserialize, Debug, Serialize)]
pub struct PartResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
