//! Agent Loop Core
//!
//! Session state and the orchestrator that drives one conversation through
//! the plan, execute and evaluate cycle.

pub mod core;
pub mod state;

pub use self::core::{is_termination, AgentCore, Turn, DEFAULT_REPLY, FAREWELL, WELCOME};
pub use state::{
    FieldKind, FieldValue, HistoryEntry, Phase, Profile, ProfileField, Role, SchemeSummary,
    SessionState,
};
