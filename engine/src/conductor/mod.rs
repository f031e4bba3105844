//! Conductor System
//!
//! One turn runs Plan → Execute → Evaluate. The planner and evaluator each
//! make one LLM call, the executor at most one (extraction). Every LLM-backed
//! step has a `try_*` form returning `StepError` and an infallible form that
//! substitutes a deterministic fallback.

pub mod context;
pub mod evaluator;
pub mod executor;
pub mod memory;
pub mod planner;
pub mod types;

pub use context::ContextAssembler;
pub use evaluator::Evaluator;
pub use executor::{Executor, Tool};
pub use memory::{Contradiction, SessionMemory};
pub use planner::Planner;
pub use types::{
    Action, ActionKind, DocumentCheck, Evaluation, ExecutionResults, Plan, StepError, ToolOutput,
};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::llm::{LLMError, LLMProvider};

/// Shared LLM access with a per-call deadline
#[derive(Clone)]
pub struct LlmHandle {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl LlmHandle {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// One completion, bounded by the configured timeout.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> Result<String, StepError> {
        match timeout(
            self.timeout,
            self.provider.generate(system_prompt, user_message, max_tokens),
        )
        .await
        {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(
                    "{} call exceeded {}s",
                    self.provider.name(),
                    self.timeout.as_secs_f64()
                );
                Err(StepError::Llm(LLMError::Timeout))
            }
        }
    }
}
