use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;

use super::credential::ApiKey;
use super::error::UpstreamError;
use super::wire::{Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use super::Turn;

/// The two call shapes the completion service offers.
///
/// `Ok(None)` means the call succeeded but produced no text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &ApiKey,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<Option<String>, UpstreamError>;

    async fn send_chat(
        &self,
        api_key: &ApiKey,
        model: &str,
        system_instruction: &str,
        transcript: &[Turn],
        message: &str,
    ) -> Result<Option<String>, UpstreamError>;
}

/// Talks to the Gemini REST API.
pub struct GeminiBackend {
    base_url: String,
    client: Client,
}

impl GeminiBackend {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Initializing completion client for: {}", base_url);

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            info!("Request timeout ceiling: {:?}", timeout);
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn generate_content(
        &self,
        api_key: &ApiKey,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<Option<String>, UpstreamError> {
        let url = self.endpoint(model);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Request to completion service failed: {}", e);
                UpstreamError::transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string()))?;

        if !status.is_success() {
            error!("Completion service returned {}", status);
            debug!("Error body: {}", body);
            return Err(upstream_error(status.as_u16(), &body));
        }

        debug!("Response body: {}", body);
        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Unreadable response envelope: {}", e);
            UpstreamError::http(status.as_u16(), format!("unreadable response envelope: {}", e))
        })?;

        Ok(parsed.text())
    }

    async fn send_chat(
        &self,
        api_key: &ApiKey,
        model: &str,
        system_instruction: &str,
        transcript: &[Turn],
        message: &str,
    ) -> Result<Option<String>, UpstreamError> {
        let request = chat_request(system_instruction, transcript, message);
        self.generate_content(api_key, model, request).await
    }
}

/// A chat turn sequence rendered as a single `generateContent` body.
pub fn chat_request(system_instruction: &str, transcript: &[Turn], message: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = transcript
        .iter()
        .map(|turn| Content::with_role(turn.role.as_str(), turn.text.clone()))
        .collect();
    contents.push(Content::user(message));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::plain(system_instruction)),
        generation_config: None,
    }
}

fn upstream_error(status: u16, body: &str) -> UpstreamError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let err = envelope.error;
            UpstreamError {
                status: Some(err.code.unwrap_or(status)),
                provider_status: err.status,
                reasons: err.details.into_iter().filter_map(|d| d.reason).collect(),
                message: err.message,
            }
        }
        Err(_) => UpstreamError::http(status, body.trim()),
    }
}
