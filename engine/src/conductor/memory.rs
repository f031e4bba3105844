//! Session memory
//!
//! Appends each exchange to the conversation history and flags profile
//! fields the user has restated with a different value.

use serde::Serialize;

use crate::agent::state::{FieldValue, HistoryEntry, Profile, ProfileField, Role, SessionState};

/// A field restated with a different value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contradiction {
    pub field: ProfileField,
    pub old_value: FieldValue,
    pub new_value: FieldValue,
}

impl Contradiction {
    /// The disambiguation question spoken instead of the evaluator's reply
    pub fn prompt(&self) -> String {
        format!(
            "माफ करा, तुम्ही आधी {} सांगितले होते, आता {} सांगत आहात. कोणती माहिती बरोबर आहे?",
            self.old_value, self.new_value
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionMemory;

impl SessionMemory {
    pub fn new() -> Self {
        Self
    }

    /// Append the user input then the agent response.
    pub fn record_turn(&self, state: &mut SessionState, user_input: &str, agent_response: &str) {
        state
            .conversation_history
            .push(HistoryEntry::now(Role::User, user_input));
        state
            .conversation_history
            .push(HistoryEntry::now(Role::Agent, agent_response));
    }

    /// Fields present in both profiles with unequal values, in the order
    /// `new_fields` states them.
    pub fn detect_contradictions(&self, new_fields: &Profile, existing: &Profile) -> Vec<Contradiction> {
        new_fields
            .iter()
            .filter_map(|(field, new_value)| {
                let old_value = existing.get(field)?;
                (old_value != new_value).then(|| Contradiction {
                    field,
                    old_value: old_value.clone(),
                    new_value: new_value.clone(),
                })
            })
            .inspect(|c| {
                tracing::info!(
                    component = "memory",
                    field = %c.field,
                    "Contradiction detected: {} -> {}",
                    c.old_value,
                    c.new_value
                )
            })
            .collect()
    }
}
