//! Voice collaborator contracts
//!
//! The engine never touches audio. Speech recognition and synthesis live
//! behind these two traits; the engine only sees decoded text going in and
//! text going out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// One pull from a voice input source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Utterance {
    /// Decoded speech
    Text(String),

    /// Silence timeout or unrecognized speech. The turn is skipped.
    Silence,
}

impl Utterance {
    /// Build an utterance from raw decoded text; blank text counts as silence.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Utterance::Silence
        } else {
            Utterance::Text(trimmed.to_string())
        }
    }
}

/// Pull source of user utterances
#[async_trait]
pub trait VoiceInput: Send {
    /// Wait for the next utterance.
    ///
    /// Returns `Err(EngineError::InputClosed)` once the source is exhausted;
    /// other errors are reported by the caller and the turn is skipped.
    async fn listen(&mut self) -> Result<Utterance, EngineError>;
}

/// Sink that speaks agent replies
#[async_trait]
pub trait VoiceOutput: Send + Sync {
    /// Speak (or print) the given text.
    ///
    /// Implementations must degrade to text output on synthesis failure;
    /// an `Err` here is logged by the caller and never ends the session.
    async fn speak(&self, text: &str) -> Result<(), EngineError>;
}
