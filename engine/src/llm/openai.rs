//! OpenAI-compatible chat completions backend
//!
//! Used for both Groq and OpenRouter, which expose the same
//! `/chat/completions` API behind different base URLs.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde_json::json;
use std::time::Duration;

use super::{LLMError, LLMProvider, ProviderKind};
use crate::secrets::{scrub_secrets, SecretString};

pub struct ChatCompletionsProvider {
    kind: ProviderKind,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn new(
        kind: ProviderKind,
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        temperature: Option<f32>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::LLMProvider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            kind,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature,
            client,
        })
    }
}

#[async_trait]
impl LLMProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn check_health(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> super::Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            LLMError::AuthenticationFailed(format!("No API key configured for {}", self.kind))
        })?;

        let url = format!("{}/chat/completions", self.base_url);

        let mut payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_message}
            ],
            "max_tokens": max_tokens,
        });
        if let Some(temperature) = self.temperature {
            payload["temperature"] = json!(temperature);
        }

        tracing::debug!(
            "{} request: model={}, max_tokens={}",
            self.kind,
            self.model,
            max_tokens
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let err = LLMError::from_transport(e, &self.base_url);
                tracing::error!("{} request failed: {}", self.kind, err);
                err
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub_secrets(&response.text().await.unwrap_or_default());
            tracing::error!("{} API error ({}): {}", self.kind, status, text);

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => LLMError::ProviderUnavailable(format!("{}: {}", status, text)),
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }
}
