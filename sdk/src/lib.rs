//! Sahayak SDK
//!
//! Shared error type and the voice collaborator contracts. Speech
//! recognition and synthesis backends implement the traits here without
//! depending on the engine.

/// Error types and handling
pub mod errors;

/// Voice input/output contracts
pub mod voice;

// Re-export commonly used types
pub use errors::{EngineError, SahayakErrorExt, GENERIC_APOLOGY};
pub use voice::{Utterance, VoiceInput, VoiceOutput};
