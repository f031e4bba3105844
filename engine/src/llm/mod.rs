//! LLM Provider Abstraction Layer
//!
//! The planner, the extraction tool and the evaluator all talk to a language
//! model through the `LLMProvider` trait: one system prompt, one user
//! message, one text completion back. Three backends implement it:
//!
//! - `groq` and `openrouter` via the OpenAI-compatible chat completions API
//!   (`openai.rs`)
//! - `ollama` via the local `/api/generate` endpoint (`ollama.rs`)
//!
//! Model output is untrusted. `decode_json` strips an optional markdown
//! fence and decodes into a typed schema; callers fall back to fixed
//! defaults when it fails.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LLMConfig;
use crate::secrets::SecretString;

pub mod ollama;
pub mod openai;

pub use ollama::OllamaProvider;
pub use openai::ChatCompletionsProvider;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LLMError {
    /// Map a reqwest transport error onto the taxonomy.
    pub(crate) fn from_transport(err: reqwest::Error, endpoint: &str) -> Self {
        if err.is_timeout() {
            LLMError::Timeout
        } else if err.is_connect() {
            LLMError::ProviderUnavailable(format!("Cannot connect to {}", endpoint))
        } else {
            LLMError::NetworkError(err.to_string())
        }
    }
}

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Groq,
    Ollama,
    OpenRouter,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// Provider-specific API key variable; `None` for local backends.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "ollama" => Ok(ProviderKind::Ollama),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            other => Err(EngineError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// LLM Provider trait that all backends implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Backend name ("groq", "ollama", "openrouter")
    fn name(&self) -> &str;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Returns true for backends running on this machine
    fn is_local(&self) -> bool {
        false
    }

    /// Generate one completion.
    ///
    /// # Arguments
    /// * `system_prompt` - Role and output contract for the model
    /// * `user_message` - The context bundle for this call
    /// * `max_tokens` - Upper bound on generated tokens
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> Result<String>;

    /// Check if the provider is currently reachable.
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Build the configured backend.
///
/// # Errors
///
/// Returns `EngineError::UnsupportedProvider` for an unknown provider name,
/// or `EngineError::LLMProvider` if the HTTP client cannot be created.
pub fn from_config(
    config: &LLMConfig,
    api_key: Option<SecretString>,
) -> std::result::Result<Arc<dyn LLMProvider>, EngineError> {
    let kind = config.kind()?;
    let model = config.resolved_model()?;
    let timeout = config.request_timeout();

    let provider: Arc<dyn LLMProvider> = match kind {
        ProviderKind::Groq => Arc::new(ChatCompletionsProvider::new(
            kind,
            &config.groq.base_url,
            model,
            api_key,
            Some(0.7),
            timeout,
        )?),
        ProviderKind::OpenRouter => Arc::new(ChatCompletionsProvider::new(
            kind,
            &config.openrouter.base_url,
            model,
            api_key,
            None,
            timeout,
        )?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(
            &config.ollama.base_url,
            model,
            timeout,
        )?),
    };

    tracing::info!(
        "LLM provider ready: {} (model {}, timeout {}s)",
        provider.name(),
        provider.model(),
        timeout.as_secs()
    );

    Ok(provider)
}

/// Remove an optional markdown code fence around model output.
///
/// Takes the body after ```` ```json ```` if present, otherwise after a bare
/// ```` ``` ````, up to the next closing fence. Text without a fence is
/// returned trimmed.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    let body = if let Some(pos) = trimmed.find("```json") {
        &trimmed[pos + "```json".len()..]
    } else if let Some(pos) = trimmed.find("```") {
        &trimmed[pos + 3..]
    } else {
        return trimmed;
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Strip fences, then decode into `T`.
pub fn decode_json<T: DeserializeOwned>(content: &str) -> serde_json::Result<T> {
    serde_json::from_str(strip_code_fence(content))
}
