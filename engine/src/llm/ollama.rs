//! Ollama LLM Provider
//!
//! Ollama runs models locally on the user's machine, typically at
//! http://localhost:11434. Requests go to `/api/generate` with the system
//! prompt and the user message joined into a single prompt.
//!
//! Key features:
//! - Local execution (no API keys required)
//! - Non-streaming completions bounded by `options.num_predict`
//! - Health check via `/api/tags`

use async_trait::async_trait;
use reqwest::Client;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LLMError, LLMProvider, Result};
use crate::secrets::scrub_secrets;

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Base URL for Ollama API (typically http://localhost:11434)
    base_url: String,

    /// Model name to use (e.g., "llama3.2")
    model: String,

    /// HTTP client for API requests
    client: Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Arguments
    /// * `base_url` - Base URL for Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name to use (e.g., "llama3.2")
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::LLMProvider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: format!("{}\n\n{}", system_prompt, user_message),
            stream: false,
            options: GenerateOptions {
                num_predict: max_tokens,
            },
        };

        tracing::debug!(
            "Ollama request: model={}, prompt_chars={}, num_predict={}",
            self.model,
            request.prompt.len(),
            max_tokens
        );

        let url = format!("{}/api/generate", self.base_url);
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let err = LLMError::from_transport(e, &self.base_url);
                tracing::error!("Ollama request failed: {}", err);
                err
            })?;

        tracing::debug!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            let status = response.status();
            let error_text = scrub_secrets(&response.text().await.unwrap_or_default());
            tracing::error!("Ollama API error ({}): {}", status, error_text);
            return Err(LLMError::ProviderUnavailable(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(body.response)
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Ollama health check failed: {}", e);
                false
            }
        }
    }
}

/// Ollama `/api/generate` request body
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

/// Ollama `/api/generate` response body (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_properties() {
        let provider =
            OllamaProvider::new("http://localhost:11434/", "llama3.2", Duration::from_secs(8))
                .unwrap();

        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "llama3.2");
        assert!(provider.is_local());
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "system\n\nuser".to_string(),
            stream: false,
            options: GenerateOptions { num_predict: 500 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 500);
        assert_eq!(json["prompt"], "system\n\nuser");
    }
}
