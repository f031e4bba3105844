//! Eligibility engine
//!
//! Matches a partial user profile against scheme criteria. Matching is
//! open-world: a criterion whose field is absent from the profile is
//! satisfied. Only facts the user actually stated can rule a scheme out.
//!
//! Constraint kinds:
//!
//! - **Range**: numeric `{min, max}`, either bound optional
//! - **Equals**: booleans exact, text case-insensitive
//! - **Gated**: any criterion may name a gate field; it is only checked
//!   once the gate's own criterion has passed earlier in the same scheme
//!
//! Malformed criteria (range on a non-numeric field, mismatched value kind,
//! `min > max`, a gate with no earlier criterion) exclude the scheme. They
//! are logged at debug and never fail the turn.
//!
//! # Examples
//!
//! ```
//! use sahayak_engine::agent::state::{Profile, ProfileField};
//! use sahayak_engine::eligibility::{self, catalog};
//!
//! let profile = Profile::new()
//!     .with(ProfileField::Age, 30.0)
//!     .with(ProfileField::Occupation, "farmer");
//!
//! let ids: Vec<&str> = eligibility::evaluate(&profile, catalog::schemes())
//!     .iter()
//!     .map(|s| s.id)
//!     .collect();
//! assert!(ids.contains(&"pm_kisan"));
//! ```

pub mod catalog;

use crate::agent::state::{FieldKind, FieldValue, Profile, ProfileField, SchemeSummary};

/// Constraint on a single profile field
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive numeric bounds
    Range { min: Option<f64>, max: Option<f64> },
    /// Exact match (text compared case-insensitively)
    Equals(FieldValue),
}

/// One field constraint within a scheme
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: ProfileField,
    pub constraint: Constraint,
    /// Only evaluated after this field's criterion has passed
    pub gate: Option<ProfileField>,
}

impl Criterion {
    pub fn range(field: ProfileField, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            field,
            constraint: Constraint::Range { min, max },
            gate: None,
        }
    }

    pub fn equals(field: ProfileField, value: impl Into<FieldValue>) -> Self {
        Self {
            field,
            constraint: Constraint::Equals(value.into()),
            gate: None,
        }
    }

    pub fn gated_by(mut self, gate: ProfileField) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Structural problems that make this criterion unusable
    fn malformation(&self) -> Option<String> {
        match &self.constraint {
            Constraint::Range { .. } if self.field.kind() != FieldKind::Number => {
                Some(format!("range constraint on non-numeric field {}", self.field))
            }
            Constraint::Range {
                min: Some(min),
                max: Some(max),
            } if min > max => Some(format!("empty range {}..{} on {}", min, max, self.field)),
            Constraint::Equals(value) if value.kind() != self.field.kind() => {
                Some(format!("value kind mismatch on {}", self.field))
            }
            _ => None,
        }
    }
}

/// A government scheme and its eligibility rules
#[derive(Debug, Clone)]
pub struct Scheme {
    pub id: &'static str,
    pub name: &'static str,
    pub criteria: Vec<Criterion>,
}

impl Scheme {
    pub fn summary(&self) -> SchemeSummary {
        SchemeSummary {
            id: self.id.to_string(),
            name: self.name.to_string(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Satisfied,
    Vacuous,
    Violated,
    Malformed(String),
}

fn check(criterion: &Criterion, profile: &Profile) -> Outcome {
    if let Some(reason) = criterion.malformation() {
        return Outcome::Malformed(reason);
    }

    let Some(value) = profile.get(criterion.field) else {
        return Outcome::Vacuous;
    };

    let passed = match (&criterion.constraint, value) {
        (Constraint::Range { min, max }, FieldValue::Number(n)) => {
            min.map_or(true, |m| *n >= m) && max.map_or(true, |m| *n <= m)
        }
        (Constraint::Equals(FieldValue::Flag(expected)), FieldValue::Flag(actual)) => {
            expected == actual
        }
        (Constraint::Equals(FieldValue::Text(expected)), FieldValue::Text(actual)) => {
            expected.trim().to_lowercase() == actual.trim().to_lowercase()
        }
        (Constraint::Equals(FieldValue::Number(expected)), FieldValue::Number(actual)) => {
            expected == actual
        }
        _ => {
            return Outcome::Malformed(format!(
                "profile value for {} has the wrong kind",
                criterion.field
            ))
        }
    };

    if passed {
        Outcome::Satisfied
    } else {
        Outcome::Violated
    }
}

/// Does `profile` satisfy every applicable criterion of `scheme`?
pub fn matches(profile: &Profile, scheme: &Scheme) -> bool {
    let mut passed: Vec<ProfileField> = Vec::with_capacity(scheme.criteria.len());

    for criterion in &scheme.criteria {
        if let Some(gate) = criterion.gate {
            if !passed.contains(&gate) {
                tracing::debug!(
                    "Scheme {} excluded: gate {} for {} has no earlier passing criterion",
                    scheme.id,
                    gate,
                    criterion.field
                );
                return false;
            }
        }

        match check(criterion, profile) {
            Outcome::Satisfied | Outcome::Vacuous => passed.push(criterion.field),
            Outcome::Violated => return false,
            Outcome::Malformed(reason) => {
                tracing::debug!("Scheme {} excluded: {}", scheme.id, reason);
                return false;
            }
        }
    }

    true
}

/// All matching schemes, in catalog order.
pub fn evaluate<'a>(profile: &Profile, catalog: &'a [Scheme]) -> Vec<&'a Scheme> {
    catalog.iter().filter(|s| matches(profile, s)).collect()
}

/// `evaluate`, reduced to `{id, name}` summaries.
pub fn summaries(profile: &Profile, catalog: &[Scheme]) -> Vec<SchemeSummary> {
    evaluate(profile, catalog)
        .into_iter()
        .map(Scheme::summary)
        .collect()
}
