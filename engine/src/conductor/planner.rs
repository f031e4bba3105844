//! Conductor Planner
//!
//! Turns the raw user utterance into a `Plan`: an intent label and an ordered
//! list of actions drawn from the four known tools.

use crate::agent::state::SessionState;
use crate::conductor::context::ContextAssembler;
use crate::conductor::types::{Plan, RawPlan, StepError};
use crate::conductor::LlmHandle;
use crate::llm::decode_json;

const MAX_TOKENS: u32 = 1000;

const SYSTEM_PROMPT: &str = r#"तुम्ही एक सरकारी योजना सहाय्यक आहात. वापरकर्त्याच्या इनपुटचे विश्लेषण करा आणि कृती योजना तयार करा.

तुम्हाला फक्त JSON फॉरमॅटमध्ये उत्तर द्यावे (कोणतेही अतिरिक्त मजकूर नको):
{
  "intent": "user's intent",
  "actions": [{"type": "action_type", "params": {}}],
  "userInput": "original input"
}

Available actions:
- extract_info: वापरकर्त्याची माहिती काढा
- check_eligibility: योजनांसाठी पात्रता तपासा
- fetch_scheme_details: योजना तपशील आणा (params: {"schemeId": "pmay|atal_pension|pm_kisan|sukanya_samriddhi|ayushman_bharat"})
- validate_documents: कागदपत्रे तपासा"#;

pub struct Planner {
    llm: LlmHandle,
    context: ContextAssembler,
}

impl Planner {
    pub fn new(llm: LlmHandle, context: ContextAssembler) -> Self {
        Self { llm, context }
    }

    /// Plan the turn, falling back to `Plan::fallback` on any failure.
    pub async fn plan(&self, user_input: &str, state: &SessionState) -> Plan {
        match self.try_plan(user_input, state).await {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(component = "planner", "Planning failed, using fallback plan: {}", e);
                Plan::fallback(user_input)
            }
        }
    }

    /// Plan the turn, surfacing LLM and decode failures.
    pub async fn try_plan(&self, user_input: &str, state: &SessionState) -> Result<Plan, StepError> {
        tracing::debug!(component = "planner", "Planning for phase {}", state.phase);

        let user_message = self.context.planner_message(user_input, state);
        let response = self
            .llm
            .complete(SYSTEM_PROMPT, &user_message, MAX_TOKENS)
            .await?;

        let plan = parse_plan(&response, user_input)?;
        tracing::info!(
            component = "planner",
            intent = %plan.intent,
            actions = plan.actions.len(),
            "Plan ready"
        );
        Ok(plan)
    }
}

/// Decode model output into a `Plan`. The model's echo of the input is ignored.
fn parse_plan(content: &str, user_input: &str) -> Result<Plan, StepError> {
    let raw: RawPlan = decode_json(content)?;

    let actions = raw
        .actions
        .into_iter()
        .filter_map(|action| {
            let name = action.kind.clone();
            let mapped = action.into_action();
            if mapped.is_none() {
                tracing::warn!(component = "planner", "Skipping unknown action type '{}'", name);
            }
            mapped
        })
        .collect();

    Ok(Plan {
        intent: raw
            .intent
            .filter(|i| !i.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        actions,
        user_input: user_input.to_string(),
    })
}
