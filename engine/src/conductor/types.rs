//! Conductor data types
//!
//! Records passed between planner, executor and evaluator within one turn.

use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::state::{Phase, Profile, SchemeSummary};
use crate::eligibility::catalog::{self, SchemeDetails};
use crate::llm::LLMError;

/// Why an LLM-backed step produced no usable output
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LLMError),

    #[error("Output contract violated: {0}")]
    Contract(#[from] serde_json::Error),
}

/// The four actions a plan can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ExtractInfo,
    CheckEligibility,
    FetchSchemeDetails,
    ValidateDocuments,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::ExtractInfo => "extract_info",
            ActionKind::CheckEligibility => "check_eligibility",
            ActionKind::FetchSchemeDetails => "fetch_scheme_details",
            ActionKind::ValidateDocuments => "validate_documents",
        }
    }

    pub fn from_type(name: &str) -> Option<Self> {
        match name.trim() {
            "extract_info" => Some(ActionKind::ExtractInfo),
            "check_eligibility" => Some(ActionKind::CheckEligibility),
            "fetch_scheme_details" => Some(ActionKind::FetchSchemeDetails),
            "validate_documents" => Some(ActionKind::ValidateDocuments),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters an action may carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionParams {
    #[serde(rename = "schemeId", skip_serializing_if = "Option::is_none")]
    pub scheme_id: Option<String>,
}

/// One planned action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub params: ActionParams,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            params: ActionParams::default(),
        }
    }

    pub fn fetch_details(scheme_id: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::FetchSchemeDetails,
            params: ActionParams {
                scheme_id: Some(scheme_id.into()),
            },
        }
    }
}

/// Structured action list for one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub intent: String,
    pub actions: Vec<Action>,
    pub user_input: String,
}

impl Plan {
    /// Deterministic plan used whenever planning fails
    pub fn fallback(user_input: &str) -> Self {
        Self {
            intent: "gather_info".to_string(),
            actions: vec![Action::new(ActionKind::ExtractInfo)],
            user_input: user_input.to_string(),
        }
    }
}

/// Planner output as the model writes it
#[derive(Debug, Deserialize)]
pub(crate) struct RawPlan {
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

impl RawAction {
    /// Map onto the closed action set; `None` for unknown types.
    pub fn into_action(self) -> Option<Action> {
        let kind = ActionKind::from_type(&self.kind)?;
        let scheme_id = self
            .params
            .get("schemeId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Some(Action {
            kind,
            params: ActionParams { scheme_id },
        })
    }
}

/// Result of `validate_documents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCheck {
    pub valid: bool,
    pub missing_docs: Vec<String>,
}

/// What a tool returned
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Extracted(Profile),
    Eligible(Vec<SchemeSummary>),
    Details(Option<&'static SchemeDetails>),
    Documents(DocumentCheck),
}

/// Tool outputs for one plan, keyed by action kind in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResults {
    entries: Vec<(ActionKind, ToolOutput)>,
}

impl ExecutionResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an output; a repeated kind overwrites the earlier value in place.
    pub fn insert(&mut self, kind: ActionKind, output: ToolOutput) {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = output,
            None => self.entries.push((kind, output)),
        }
    }

    pub fn get(&self, kind: ActionKind) -> Option<&ToolOutput> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, output)| output)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionKind, &ToolOutput)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExecutionResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (kind, output) in &self.entries {
            map.serialize_entry(kind.as_str(), output)?;
        }
        map.end()
    }
}

/// Evaluator verdict for one turn. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    #[serde(default, deserialize_with = "active_phase")]
    pub next_phase: Option<Phase>,

    #[serde(default)]
    pub response: Option<String>,

    #[serde(default)]
    pub updated_profile: Option<Profile>,

    #[serde(default, deserialize_with = "scheme_list")]
    pub eligible_schemes: Option<Vec<SchemeSummary>>,

    #[serde(default, deserialize_with = "string_list")]
    pub missing_info: Option<Vec<String>>,

    /// `None`: leave unchanged. `Some(None)`: clear.
    #[serde(default, deserialize_with = "scheme_choice")]
    pub selected_scheme: Option<Option<SchemeSummary>>,
}

pub const EVALUATION_FALLBACK_RESPONSE: &str =
    "कृपया तुमची माहिती सांगा - तुमचे वय, उत्पन्न आणि व्यवसाय.";

impl Evaluation {
    /// Deterministic verdict used whenever evaluation fails
    pub fn fallback() -> Self {
        Self {
            next_phase: Some(Phase::Gathering),
            response: Some(EVALUATION_FALLBACK_RESPONSE.to_string()),
            updated_profile: Some(Profile::new()),
            eligible_schemes: Some(Vec::new()),
            missing_info: Some(vec![
                "age".to_string(),
                "income".to_string(),
                "occupation".to_string(),
            ]),
            selected_scheme: None,
        }
    }
}

/// Only the five phases the evaluator may move to
fn active_phase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Phase>, D::Error> {
    match Option::<Phase>::deserialize(deserializer)? {
        Some(Phase::Idle) => Err(D::Error::custom("nextPhase may not be idle")),
        other => Ok(other),
    }
}

/// A scheme mention may be an id, a display name, or an object with `id`/`name`.
fn resolve_mention(raw: &Value) -> Option<SchemeSummary> {
    let scheme = match raw {
        Value::String(s) => catalog::resolve(s),
        Value::Object(obj) => obj
            .get("id")
            .and_then(Value::as_str)
            .and_then(catalog::resolve)
            .or_else(|| obj.get("name").and_then(Value::as_str).and_then(catalog::resolve)),
        _ => None,
    };

    if scheme.is_none() {
        tracing::debug!("Dropping unresolvable scheme mention: {}", raw);
    }
    scheme.map(|s| s.summary())
}

fn scheme_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<SchemeSummary>>, D::Error> {
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw.map(|items| {
        let mut schemes: Vec<SchemeSummary> = Vec::with_capacity(items.len());
        for summary in items.iter().filter_map(resolve_mention) {
            if !schemes.contains(&summary) {
                schemes.push(summary);
            }
        }
        schemes
    }))
}

fn string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw.map(|items| {
        items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect()
    }))
}

/// Present-but-null clears; unresolvable leaves the selection untouched.
fn scheme_choice<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<SchemeSummary>>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(Some(None));
    }
    Ok(resolve_mention(&raw).map(Some))
}
