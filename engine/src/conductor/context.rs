//! Context Assembler
//!
//! Packs session state into the bounded JSON bundles sent to the LLM. The
//! planner sees the last five history entries, the evaluator the last three
//! and only the names of the currently eligible schemes.

use serde_json::{json, Value};

use crate::agent::state::SessionState;
use crate::conductor::types::{ExecutionResults, Plan};

/// History window for planning
pub const PLANNER_HISTORY: usize = 5;

/// History window for evaluation
pub const EVALUATOR_HISTORY: usize = 3;

const JSON_ONLY: &str = "फक्त JSON उत्तर द्या.";
const JSON_ONLY_NO_EXPLANATION: &str = "फक्त JSON उत्तर द्या, कोणतेही स्पष्टीकरण नको.";

#[derive(Debug, Clone)]
pub struct ContextAssembler {
    planner_history: usize,
    evaluator_history: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(PLANNER_HISTORY, EVALUATOR_HISTORY)
    }
}

impl ContextAssembler {
    pub fn new(planner_history: usize, evaluator_history: usize) -> Self {
        Self {
            planner_history,
            evaluator_history,
        }
    }

    /// Context bundle for the planner
    pub fn planner_context(&self, user_input: &str, state: &SessionState) -> Value {
        json!({
            "userInput": user_input,
            "currentPhase": state.phase,
            "userProfile": state.profile,
            "conversationHistory": state.recent_history(self.planner_history),
        })
    }

    /// Context bundle for the evaluator
    pub fn evaluator_context(
        &self,
        results: &ExecutionResults,
        state: &SessionState,
        plan: &Plan,
    ) -> Value {
        let eligible_names: Vec<&str> = state
            .eligible_schemes
            .iter()
            .map(|s| s.name.as_str())
            .collect();

        json!({
            "results": results,
            "currentState": {
                "phase": state.phase,
                "userProfile": state.profile,
                "eligibleSchemes": eligible_names,
            },
            "conversationHistory": state.recent_history(self.evaluator_history),
            "plan": plan,
        })
    }

    /// User message for the planner call
    pub fn planner_message(&self, user_input: &str, state: &SessionState) -> String {
        render(&self.planner_context(user_input, state), JSON_ONLY_NO_EXPLANATION)
    }

    /// User message for the evaluator call
    pub fn evaluator_message(
        &self,
        results: &ExecutionResults,
        state: &SessionState,
        plan: &Plan,
    ) -> String {
        render(&self.evaluator_context(results, state, plan), JSON_ONLY)
    }

    /// User message for the extraction call
    pub fn extraction_message(&self, user_input: &str) -> String {
        format!("Input: {}\n\n{}", user_input, JSON_ONLY)
    }
}

/// serde_json keeps non-ASCII text unescaped, so Marathi stays readable to the model.
fn render(context: &Value, instruction: &str) -> String {
    format!("Context: {}\n\n{}", context, instruction)
}
