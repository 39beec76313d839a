use reqwest::Client;

use crate::config::GeminiConfig;
use crate::errors::{GeminiError, GeminiResult};
use crate::types::*;

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    model: GeminiModel,
    system_instruction: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GeminiError::ConfigError(
                "API key is required to initialize the Gemini client".to_string(),
            )
        })?;

        let model = GeminiModel::new(api_key, config.model_name.clone());
        let system_instruction = config.load_system_instruction();

        let client = Client::new();

        Ok(Self {
            client,
            model,
            system_instruction,
        })
    }

    /// Get the base API URL
    fn get_base_url(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model.model_name, self.model.api_key
        )
    }

    /// Generate content using the Gemini API
    pub async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = self.get_base_url();

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                GeminiError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiError::ParsingError(format!("Failed to parse response: {}", e)))?;

        Ok(response_body)
    }

    /// Creates a GenerateContentRequest wrapping a prepared conversation.
    fn build_request(&self, contents: Vec<Content>) -> GenerateContentRequest {
        let system_instruction = self.system_instruction.as_ref().map(|text| Content {
            parts: vec![Part::text(text.clone())],
            role: Some("system".to_string()),
        });

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                ..GenerationConfig::default()
            }),
        }
    }

    /// Helper method to extract text from a response
    pub fn extract_text_from_response(
        &self,
        response: &GenerateContentResponse,
    ) -> GeminiResult<String> {
        if response.candidates.is_empty() {
            return Err(GeminiError::ResponseError(
                "No candidates in response".to_string(),
            ));
        }

        let candidate = &response.candidates[0];
        let content = candidate
            .content
            .as_ref()
            .ok_or_else(|| GeminiError::ResponseError("No content in candidate".to_string()))?;

        if content.parts.is_empty() {
            return Err(GeminiError::ResponseError(
                "No parts in content".to_string(),
            ));
        }

        let part = &content.parts[0];
        let text = part
            .text
            .as_ref()
            .ok_or_else(|| GeminiError::ResponseError("No text in part".to_string()))?;

        Ok(text.clone())
    }

    /// Send a prepared conversation and return the reply text.
    pub async fn generate(&self, contents: Vec<Content>) -> GeminiResult<String> {
        let request = self.build_request(contents);
        let response = self.generate_content(request).await?;
        self.extract_text_from_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: Some("test-key".to_string()),
            model_name: Some("gemini-2.0-flash".to_string()),
            system_instruction_file: None,
        })
        .unwrap()
    }

    #[test]
    fn new_requires_api_key() {
        let result = GeminiClient::new(GeminiConfig {
            api_key: None,
            ..GeminiConfig::default()
        });

        assert!(matches!(result, Err(GeminiError::ConfigError(_))));
    }

    #[test]
    fn extract_text_returns_first_part() {
        let client = test_client();
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(ContentResponsePart {
                    parts: vec![PartResponse {
                        text: Some("hello".to_string()),
                    }],
                    role: Some("model".to_string()),
                }),
            }],
        };

        assert_eq!(client.extract_text_from_response(&response).unwrap(), "hello");
    }

    #[test]
    fn extract_text_rejects_empty_candidates() {
        let client = test_client();
        let response = GenerateContentResponse { candidates: vec![] };

        assert!(matches!(
            client.extract_text_from_response(&response),
            Err(GeminiError::ResponseError(_))
        ));
    }

    #[test]
    fn extract_text_rejects_candidate_without_content() {
        let client = test_client();
        let response = GenerateContentResponse {
            candidates: vec![Candidate { content: None }],
        };

        assert!(matches!(
            client.extract_text_from_response(&response),
            Err(GeminiError::ResponseError(_))
        ));
    }

    #[test]
    fn build_request_carries_no_system_instruction_when_unset() {
        let client = test_client();
        let request = client.build_request(vec![Content {
            parts: vec![Part::text("hi".to_string())],
            role: Some("user".to_string()),
        }]);

        assert!(request.system_instruction.is_none());
        assert_eq!(request.contents.len(), 1);
    }
}
