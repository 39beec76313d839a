use reqwest::Client;
use tracing::debug;

use crate::errors::{LineError, LineResult};
use crate::types::{OutgoingMessage, Profile, ReplyRequest};

/// Default host for the Messaging API.
pub const API_BASE_URL: &str = "https://api.line.me";
/// Default host for binary message content.
pub const DATA_API_BASE_URL: &str = "https://api-data.line.me";

/// Client for the LINE Messaging API
#[derive(Debug, Clone)]
pub struct LineClient {
    client: Client,
    access_token: String,
    api_base: String,
    data_api_base: String,
}

impl LineClient {
    /// Create a new Messaging API client authenticated with a channel access
    /// token.
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            api_base: API_BASE_URL.to_string(),
            data_api_base: DATA_API_BASE_URL.to_string(),
        }
    }

    /// Override the API hosts, for tests against a local server.
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        data_api_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.data_api_base = data_api_base.into();
        self
    }

    /// Send a reply bound to a one-time reply token.
    ///
    /// The platform accepts at most five messages per reply and invalidates
    /// the token after the first use, successful or not.
    pub async fn reply(
        &self,
        reply_token: &str,
        messages: Vec<OutgoingMessage>,
    ) -> LineResult<()> {
        let url = format!("{}/v2/bot/message/reply", self.api_base);
        let request = ReplyRequest {
            reply_token: reply_token.to_string(),
            messages,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| LineError::RequestError(format!("Failed to send reply: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::HttpError {
                status_code: status.as_u16(),
                message: format!("Reply request failed: {}", body),
            });
        }

        debug!("Reply delivered");
        Ok(())
    }

    /// Fetch a user's profile.
    pub async fn get_profile(&self, user_id: &str) -> LineResult<Profile> {
        let url = format!("{}/v2/bot/profile/{}", self.api_base, user_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| LineError::RequestError(format!("Failed to fetch profile: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::HttpError {
                status_code: status.as_u16(),
                message: format!("Profile request failed: {}", body),
            });
        }

        response
            .json::<Profile>()
            .await
            .map_err(|e| LineError::ResponseError(format!("Failed to parse profile: {}", e)))
    }

    /// Download the binary content of a message stored by the platform.
    pub async fn get_message_content(&self, message_id: &str) -> LineResult<Vec<u8>> {
        let url = format!("{}/v2/bot/message/{}/content", self.data_api_base, message_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| LineError::RequestError(format!("Failed to fetch content: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::HttpError {
                status_code: status.as_u16(),
                message: format!("Content request failed: {}", body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LineError::ResponseError(format!("Failed to read content: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
