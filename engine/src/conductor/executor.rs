//! Conductor Executor
//!
//! Runs each planned action through the matching tool and collects the
//! outputs. Fields extracted earlier in the plan are visible to later
//! eligibility checks in the same plan; the session state itself is never
//! touched here.

use crate::agent::state::{Profile, SchemeSummary, SessionState};
use crate::conductor::context::ContextAssembler;
use crate::conductor::types::{
    Action, ActionKind, DocumentCheck, ExecutionResults, Plan, StepError, ToolOutput,
};
use crate::conductor::LlmHandle;
use crate::eligibility::{self, catalog};
use crate::llm::decode_json;
use serde::Deserialize;

const EXTRACTION_MAX_TOKENS: u32 = 500;

const EXTRACTION_PROMPT: &str = r#"तुम्ही वापरकर्त्याच्या मराठी इनपुटमधून माहिती काढा. फक्त JSON फॉरमॅटमध्ये उत्तर द्या:
{
  "extracted": {
    "age": number or null,
    "income": number or null,
    "occupation": "string" or null,
    "owns_house": boolean or null,
    "land_ownership": boolean or null,
    "has_daughter": boolean or null,
    "daughter_age": number or null
  }
}

उदाहरण:
Input: "माझे वय ३० वर्षे आहे आणि मी शेतकरी आहे"
Output: {"extracted": {"age": 30, "occupation": "farmer", "income": null, "owns_house": null, "land_ownership": null, "has_daughter": null, "daughter_age": null}}"#;

/// The closed tool table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ExtractInfo,
    CheckEligibility,
    FetchSchemeDetails,
    ValidateDocuments,
}

impl Tool {
    pub fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::ExtractInfo => Tool::ExtractInfo,
            ActionKind::CheckEligibility => Tool::CheckEligibility,
            ActionKind::FetchSchemeDetails => Tool::FetchSchemeDetails,
            ActionKind::ValidateDocuments => Tool::ValidateDocuments,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::ExtractInfo => "extract_info",
            Tool::CheckEligibility => "check_eligibility",
            Tool::FetchSchemeDetails => "fetch_scheme_details",
            Tool::ValidateDocuments => "validate_documents",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    extracted: Profile,
}

pub struct Executor {
    llm: LlmHandle,
    context: ContextAssembler,
}

impl Executor {
    pub fn new(llm: LlmHandle, context: ContextAssembler) -> Self {
        Self { llm, context }
    }

    /// Run every action of `plan` in order.
    pub async fn execute(&self, plan: &Plan, state: &SessionState) -> ExecutionResults {
        let mut results = ExecutionResults::new();
        let mut turn_profile = state.profile.clone();

        for action in &plan.actions {
            let tool = Tool::for_action(action.kind);
            tracing::debug!(component = "executor", tool = tool.name(), "Invoking tool");

            let output = self.invoke(tool, action, plan, state, &turn_profile).await;
            if let ToolOutput::Extracted(extracted) = &output {
                turn_profile.merge(extracted);
            }
            results.insert(action.kind, output);
        }

        tracing::info!(
            component = "executor",
            tools = results.len(),
            "Executed {} action(s)",
            plan.actions.len()
        );
        results
    }

    async fn invoke(
        &self,
        tool: Tool,
        action: &Action,
        plan: &Plan,
        state: &SessionState,
        turn_profile: &Profile,
    ) -> ToolOutput {
        match tool {
            Tool::ExtractInfo => ToolOutput::Extracted(self.extract(&plan.user_input).await),
            Tool::CheckEligibility => ToolOutput::Eligible(check_eligibility(turn_profile)),
            Tool::FetchSchemeDetails => {
                ToolOutput::Details(fetch_scheme_details(action, state))
            }
            Tool::ValidateDocuments => ToolOutput::Documents(validate_documents()),
        }
    }

    /// Extract profile fields, falling back to an empty profile on any failure.
    pub async fn extract(&self, user_input: &str) -> Profile {
        match self.try_extract(user_input).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(component = "tool", tool = "extract_info", "Extraction failed: {}", e);
                Profile::new()
            }
        }
    }

    /// Extract profile fields from the raw utterance.
    pub async fn try_extract(&self, user_input: &str) -> Result<Profile, StepError> {
        let user_message = self.context.extraction_message(user_input);
        let response = self
            .llm
            .complete(EXTRACTION_PROMPT, &user_message, EXTRACTION_MAX_TOKENS)
            .await?;

        let parsed: ExtractionResponse = decode_json(&response)?;
        tracing::debug!(component = "tool", tool = "extract_info", "Extracted {}", parsed.extracted);
        Ok(parsed.extracted)
    }
}

/// Match `profile` against the static catalog.
pub fn check_eligibility(profile: &Profile) -> Vec<SchemeSummary> {
    let eligible = eligibility::summaries(profile, catalog::schemes());
    tracing::info!(
        component = "tool",
        tool = "check_eligibility",
        "Eligible schemes found: {}",
        eligible.len()
    );
    eligible
}

/// Details for the action's `schemeId`, else the currently selected scheme.
pub fn fetch_scheme_details(
    action: &Action,
    state: &SessionState,
) -> Option<&'static catalog::SchemeDetails> {
    let scheme_id = action
        .params
        .scheme_id
        .as_deref()
        .or_else(|| state.selected_scheme.as_ref().map(|s| s.id.as_str()))?;

    let details = catalog::details(scheme_id);
    if details.is_none() {
        tracing::debug!(component = "tool", "No details for scheme '{}'", scheme_id);
    }
    details
}

/// Document validation always passes.
pub fn validate_documents() -> DocumentCheck {
    DocumentCheck {
        valid: true,
        missing_docs: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::ProfileField;

    #[test]
    fn test_every_action_has_a_tool() {
        for (kind, name) in [
            (ActionKind::ExtractInfo, "extract_info"),
            (ActionKind::CheckEligibility, "check_eligibility"),
            (ActionKind::FetchSchemeDetails, "fetch_scheme_details"),
            (ActionKind::ValidateDocuments, "validate_documents"),
        ] {
            assert_eq!(Tool::for_action(kind).name(), name);
            assert_eq!(kind.as_str(), name);
        }
    }

    #[test]
    fn test_fetch_details_prefers_explicit_id() {
        let mut state = SessionState::new();
        state.selected_scheme = Some(SchemeSummary {
            id: "pmay".to_string(),
            name: "प्रधानमंत्री आवास योजना".to_string(),
        });

        let explicit = fetch_scheme_details(&Action::fetch_details("pm_kisan"), &state);
        assert_eq!(explicit.map(|d| d.website), Some("https://pmkisan.gov.in"));

        let selected = fetch_scheme_details(&Action::new(ActionKind::FetchSchemeDetails), &state);
        assert_eq!(selected.map(|d| d.website), Some("https://pmaymis.gov.in"));
    }

    #[test]
    fn test_fetch_details_unknown_or_absent() {
        let state = SessionState::new();
        assert!(fetch_scheme_details(&Action::new(ActionKind::FetchSchemeDetails), &state).is_none());
        assert!(fetch_scheme_details(&Action::fetch_details("nope"), &state).is_none());
    }

    #[test]
    fn test_validate_documents_is_fixed() {
        let check = validate_documents();
        assert!(check.valid);
        assert!(check.missing_docs.is_empty());
    }

    #[test]
    fn test_check_eligibility_uses_given_profile() {
        let profile = Profile::new().with(ProfileField::Income, 700000.0);
        let ids: Vec<String> = check_eligibility(&profile).into_iter().map(|s| s.id).collect();
        assert!(!ids.contains(&"pmay".to_string()));
        assert!(!ids.contains(&"ayushman_bharat".to_string()));
        assert!(ids.contains(&"atal_pension".to_string()));
    }

    #[test]
    fn test_extraction_response_decoding() {
        let parsed: ExtractionResponse = decode_json(
            r#"{"extracted": {"age": 30, "occupation": "farmer", "income": null, "owns_house": null}}"#,
        )
        .unwrap();
        assert_eq!(parsed.extracted.len(), 2);

        let empty: ExtractionResponse = decode_json("{}").unwrap();
        assert!(empty.extracted.is_empty());
    }
}
