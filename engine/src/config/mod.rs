//! Configuration management
//!
//! This module handles loading, validation, and management of the Sahayak
//! configuration. Configuration is stored in TOML format at
//! ~/.sahayak/config.toml. The file is optional: when it is missing the
//! built-in defaults are used and nothing is written to disk.
//!
//! # Configuration Sections
//!
//! - **core**: log level
//! - **llm**: provider selection, model override, request timeout, and
//!   per-backend endpoint settings (groq, ollama, openrouter)
//! - **voice**: optional text-to-speech command
//!
//! # Precedence
//!
//! Provider and model are the only values meant to be supplied from the
//! outside. `apply_overrides` layers CLI flags / environment variables
//! (`LLM_PROVIDER`, `LLM_MODEL`) on top of the file, then `validate` runs
//! once so an unknown provider fails before the first turn.
//!
//! # Examples
//!
//! ```no_run
//! use sahayak_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load_or_default()?;
//! config.apply_overrides(Some("ollama".to_string()), None);
//! config.validate()?;
//! println!("Provider: {}", config.llm.provider);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::ProviderKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Voice output configuration
    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider backend (groq, ollama, openrouter)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override; when unset the selected backend's model is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Per-request timeout in seconds. A timeout counts as a failed call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Groq (cloud inference) settings
    #[serde(default)]
    pub groq: GroqConfig,

    /// Ollama (local daemon) settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenRouter (OpenAI-compatible gateway) settings
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

/// Groq provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// Base URL for the Groq OpenAI-compatible API
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_groq_model")]
    pub model: String,
    // Note: API key comes from the environment or the OS keychain
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenRouter provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Base URL for the OpenRouter API
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openrouter_model")]
    pub model: String,
    // Note: API key comes from the environment or the OS keychain
}

/// Voice output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// External text-to-speech command, e.g. "espeak-ng -v mr".
    /// The reply text is written to the program's stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_command: Option<String>,

    /// Upper bound on one synthesis+playback run, in seconds
    #[serde(default = "default_tts_timeout")]
    pub tts_timeout_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_request_timeout() -> u64 {
    8
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_model() -> String {
    "meta-llama/llama-3.1-70b-instruct".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            request_timeout_secs: default_request_timeout(),
            groq: GroqConfig::default(),
            ollama: OllamaConfig::default(),
            openrouter: OpenRouterConfig::default(),
        }
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: default_groq_base_url(),
            model: default_groq_model(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: default_openrouter_base_url(),
            model: default_openrouter_model(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts_command: None,
            tts_timeout_secs: default_tts_timeout(),
        }
    }
}

impl LLMConfig {
    /// Parse the configured provider name.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnsupportedProvider` for anything other than
    /// groq, ollama or openrouter.
    pub fn kind(&self) -> Result<ProviderKind, EngineError> {
        self.provider.parse()
    }

    /// The model that will actually be requested: the explicit override if
    /// set, otherwise the selected backend's configured model.
    pub fn resolved_model(&self) -> Result<String, EngineError> {
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            return Ok(model.to_string());
        }

        Ok(match self.kind()? {
            ProviderKind::Groq => self.groq.model.clone(),
            ProviderKind::Ollama => self.ollama.model.clone(),
            ProviderKind::OpenRouter => self.openrouter.model.clone(),
        })
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl VoiceConfig {
    /// Deadline for one TTS invocation
    pub fn tts_timeout(&self) -> Duration {
        Duration::from_secs(self.tts_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location (~/.sahayak/config.toml)
    ///
    /// Falls back to defaults when the file does not exist. The result is not
    /// validated yet; call `apply_overrides` and then `validate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default() -> Result<Self, EngineError> {
        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load_from_path(&path),
            Ok(_) => Ok(Self::default()),
            Err(e) => {
                tracing::debug!("No home directory, using default config: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default configuration file path (~/.sahayak/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".sahayak").join("config.toml"))
    }

    /// Layer externally supplied provider/model on top of the file values.
    ///
    /// Blank values are ignored so an empty `LLM_MODEL=` does not erase the
    /// configured model.
    pub fn apply_overrides(&mut self, provider: Option<String>, model: Option<String>) {
        if let Some(provider) = provider.filter(|p| !p.trim().is_empty()) {
            self.llm.provider = provider.trim().to_lowercase();
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.llm.model = Some(model.trim().to_string());
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level is unknown
    /// - The provider is not groq, ollama or openrouter
    /// - The request timeout is zero
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        self.llm.kind()?;

        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.voice.tts_timeout_secs == 0 {
            return Err(EngineError::Config(
                "tts_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.request_timeout_secs, 8);
        assert_eq!(config.llm.resolved_model().unwrap(), "llama-3.3-70b-versatile");
        assert!(config.voice.tts_command.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolved_model_follows_provider() {
        let mut config = Config::default();
        config.apply_overrides(Some("ollama".to_string()), None);
        assert_eq!(config.llm.resolved_model().unwrap(), "llama3.2");

        config.apply_overrides(Some("openrouter".to_string()), None);
        assert_eq!(
            config.llm.resolved_model().unwrap(),
            "meta-llama/llama-3.1-70b-instruct"
        );
    }

    #[test]
    fn test_model_override_wins() {
        let mut config = Config::default();
        config.apply_overrides(None, Some("gemma2-9b-it".to_string()));
        assert_eq!(config.llm.resolved_model().unwrap(), "gemma2-9b-it");
    }

    #[test]
    fn test_blank_overrides_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".to_string()), Some(String::new()));
        assert_eq!(config.llm.provider, "groq");
        assert!(config.llm.model.is_none());
    }

    #[test]
    fn test_provider_override_is_normalized() {
        let mut config = Config::default();
        config.apply_overrides(Some(" Ollama ".to_string()), None);
        assert_eq!(config.llm.provider, "ollama");
    }

    #[test]
    fn test_unknown_provider_fails_validation() {
        let mut config = Config::default();
        config.apply_overrides(Some("gemini".to_string()), None);
        assert!(matches!(
            config.validate(),
            Err(EngineError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn test_invalid_log_level_fails_validation() {
        let mut config = Config::default();
        config.core.log_level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let mut config = Config::default();
        config.llm.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[llm]
provider = "ollama"

[llm.ollama]
model = "qwen2.5:7b"
"#,
        )
        .unwrap();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.llm.resolved_model().unwrap(), "qwen2.5:7b");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.llm.provider, deserialized.llm.provider);
        assert_eq!(config.llm.groq.model, deserialized.llm.groq.model);
    }
}
