//! Conductor Evaluator
//!
//! Reads the tool outputs for the turn and asks the model for the next
//! phase, the profile delta and the reply to speak. The evaluator is the
//! only component that moves the conversation between phases.

use crate::agent::state::SessionState;
use crate::conductor::context::ContextAssembler;
use crate::conductor::types::{Evaluation, ExecutionResults, Plan, StepError};
use crate::conductor::LlmHandle;
use crate::llm::decode_json;

const MAX_TOKENS: u32 = 1000;

const SYSTEM_PROMPT: &str = r#"तुम्ही अंमलबजावणीच्या परिणामांचे मूल्यांकन करा आणि पुढील पावले ठरवा.

फक्त JSON फॉरमॅटमध्ये उत्तर द्या (कोणतेही अतिरिक्त मजकूर नको):
{
  "nextPhase": "gathering|evaluating|presenting|applying|complete",
  "response": "मराठी मध्ये वापरकर्त्याला संक्षिप्त उत्तर (२-३ वाक्ये)",
  "updatedProfile": {},
  "eligibleSchemes": [],
  "missingInfo": [],
  "selectedScheme": null
}

Phases:
- gathering: माहिती गोळा करणे
- evaluating: पात्रता तपासणे
- presenting: योजना सादर करणे
- applying: अर्ज प्रक्रिया
- complete: पूर्ण झाले"#;

pub struct Evaluator {
    llm: LlmHandle,
    context: ContextAssembler,
}

impl Evaluator {
    pub fn new(llm: LlmHandle, context: ContextAssembler) -> Self {
        Self { llm, context }
    }

    /// Evaluate the turn, falling back to `Evaluation::fallback` on any failure.
    pub async fn evaluate(
        &self,
        results: &ExecutionResults,
        state: &SessionState,
        plan: &Plan,
    ) -> Evaluation {
        match self.try_evaluate(results, state, plan).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::warn!(component = "evaluator", "Evaluation failed, using fallback: {}", e);
                Evaluation::fallback()
            }
        }
    }

    pub async fn try_evaluate(
        &self,
        results: &ExecutionResults,
        state: &SessionState,
        plan: &Plan,
    ) -> Result<Evaluation, StepError> {
        let user_message = self.context.evaluator_message(results, state, plan);
        let response = self
            .llm
            .complete(SYSTEM_PROMPT, &user_message, MAX_TOKENS)
            .await?;

        let evaluation: Evaluation = decode_json(&response)?;
        tracing::info!(
            component = "evaluator",
            next_phase = ?evaluation.next_phase,
            "Evaluation ready"
        );
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::Phase;
    use crate::llm::{LLMError, LLMProvider};
    use std::sync::Arc;
    use std::time::Duration;

    struct Canned(std::result::Result<&'static str, ()>);

    #[async_trait::async_trait]
    impl LLMProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "none"
        }

        async fn generate(&self, _: &str, _: &str, _: u32) -> crate::llm::Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|_| LLMError::RateLimitExceeded)
        }
    }

    fn evaluator(reply: std::result::Result<&'static str, ()>) -> Evaluator {
        Evaluator::new(
            LlmHandle::new(Arc::new(Canned(reply)), Duration::from_secs(1)),
            ContextAssembler::default(),
        )
    }

    #[tokio::test]
    async fn test_evaluation_decoded_from_fenced_reply() {
        let evaluation = evaluator(Ok(
            "```json\n{\"nextPhase\": \"applying\", \"response\": \"अर्ज करूया\", \"selectedScheme\": \"pmay\"}\n```",
        ))
        .evaluate(&ExecutionResults::new(), &SessionState::new(), &Plan::fallback("x"))
        .await;

        assert_eq!(evaluation.next_phase, Some(Phase::Applying));
        assert_eq!(evaluation.response.as_deref(), Some("अर्ज करूया"));
        assert_eq!(
            evaluation
                .selected_scheme
                .flatten()
                .map(|s| s.id),
            Some("pmay".to_string())
        );
    }

    #[tokio::test]
    async fn test_idle_phase_falls_back() {
        let evaluation = evaluator(Ok(r#"{"nextPhase": "idle", "response": "?"}"#))
            .evaluate(&ExecutionResults::new(), &SessionState::new(), &Plan::fallback("x"))
            .await;
        assert_eq!(evaluation, Evaluation::fallback());
    }

    #[tokio::test]
    async fn test_provider_error_surfaces_from_try_evaluate() {
        let result = evaluator(Err(()))
            .try_evaluate(&ExecutionResults::new(), &SessionState::new(), &Plan::fallback("x"))
            .await;
        assert!(matches!(
            result,
            Err(StepError::Llm(LLMError::RateLimitExceeded))
        ));
    }
}
