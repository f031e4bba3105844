//! Error types and handling
//!
//! This module provides the error types used throughout the Sahayak engine.
//! All errors implement the `SahayakErrorExt` trait which provides a
//! user-facing hint (in Marathi, the language the assistant speaks) and
//! indicates whether the error is recoverable.
//!
//! # Security
//!
//! Hints are static strings. They never echo the wrapped error text, so
//! API keys or provider responses cannot leak into what the user hears.

use thiserror::Error;

/// Generic apology spoken when a turn or the process fails.
pub const GENERIC_APOLOGY: &str = "माफ करा, काहीतरी चुकले. कृपया पुन्हा प्रयत्न करा.";

/// Trait for Sahayak error extensions
///
/// Provides additional context for errors, including a user-friendly hint
/// and recoverability information. All engine errors implement this trait.
pub trait SahayakErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to speak or print to the end user and does not
    /// contain secrets or internal details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors affect a single turn. Non-recoverable errors stop
    /// the process before any turn is handled.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: invalid config file, unknown provider
/// - **LLM Provider**: provider construction failures
/// - **Secrets**: keychain access failures
/// - **Voice**: input source closed, synthesis failures
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, SahayakErrorExt};
///
/// let error = EngineError::UnsupportedProvider("gpt-x".to_string());
/// assert!(!error.is_recoverable());
///
/// let voice = EngineError::Voice("microphone busy".to_string());
/// assert!(voice.is_recoverable());
/// assert!(!voice.user_hint().contains("microphone"));
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Voice I/O errors
    #[error("Voice error: {0}")]
    Voice(String),

    #[error("Input closed")]
    InputClosed,

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SahayakErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Configuration errors
            Self::Config(_) => "कॉन्फिगरेशन फाइल तपासा.",
            Self::UnsupportedProvider(_) => {
                "LLM प्रदाता ओळखता आला नाही. groq, ollama किंवा openrouter वापरा."
            }

            // LLM provider errors
            Self::LLMProvider(_) => "LLM सेवा उपलब्ध नाही. API की आणि नेटवर्क तपासा.",

            // Keyring errors
            Self::KeyringError(_) => "सुरक्षित संग्रहात प्रवेश करता आला नाही.",

            // Voice errors
            Self::Voice(_) => "आवाज प्रक्रिया अयशस्वी झाली. मजकूर वापरला जाईल.",
            Self::InputClosed => "इनपुट बंद झाले.",

            // Generic IO error
            Self::Io(_) => "फाइल प्रणाली त्रुटी.",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors: the process cannot start a session
            Self::Config(_) | Self::UnsupportedProvider(_) | Self::InputClosed => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
