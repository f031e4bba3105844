//! Session state
//!
//! One `SessionState` exists per conversation. The orchestrator owns it and
//! is the only place it is mutated; planner, executor and evaluator receive
//! it by shared reference.
//!
//! The user profile is a partial map over a fixed schema. Values arriving
//! from the model are decoded field by field: unknown keys and nulls are
//! dropped, numbers may arrive as strings (including Devanagari digits) and
//! booleans may arrive as yes/no words.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Conversation stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Gathering,
    Evaluating,
    Presenting,
    Applying,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Gathering => "gathering",
            Phase::Evaluating => "evaluating",
            Phase::Presenting => "presenting",
            Phase::Applying => "applying",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Flag,
    Text,
}

/// The fixed profile schema. Declaration order is the iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Age,
    Income,
    Occupation,
    OwnsHouse,
    LandOwnership,
    HasDaughter,
    DaughterAge,
}

impl ProfileField {
    pub const ALL: [ProfileField; 7] = [
        ProfileField::Age,
        ProfileField::Income,
        ProfileField::Occupation,
        ProfileField::OwnsHouse,
        ProfileField::LandOwnership,
        ProfileField::HasDaughter,
        ProfileField::DaughterAge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::Income => "income",
            ProfileField::Occupation => "occupation",
            ProfileField::OwnsHouse => "owns_house",
            ProfileField::LandOwnership => "land_ownership",
            ProfileField::HasDaughter => "has_daughter",
            ProfileField::DaughterAge => "daughter_age",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key.trim())
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ProfileField::Age | ProfileField::Income | ProfileField::DaughterAge => {
                FieldKind::Number
            }
            ProfileField::Occupation => FieldKind::Text,
            ProfileField::OwnsHouse | ProfileField::LandOwnership | ProfileField::HasDaughter => {
                FieldKind::Flag
            }
        }
    }

    /// Decode a raw JSON value for this field.
    ///
    /// Returns `None` for `null` and for values that do not fit the field.
    pub fn decode(&self, raw: &Value) -> Option<FieldValue> {
        match (self.kind(), raw) {
            (_, Value::Null) => None,
            (FieldKind::Number, Value::Number(n)) => {
                n.as_f64().filter(|v| v.is_finite()).map(FieldValue::Number)
            }
            (FieldKind::Number, Value::String(s)) => parse_number(s).map(FieldValue::Number),
            (FieldKind::Flag, Value::Bool(b)) => Some(FieldValue::Flag(*b)),
            (FieldKind::Flag, Value::String(s)) => parse_flag(s).map(FieldValue::Flag),
            (FieldKind::Text, Value::String(s)) => {
                let s = s.trim();
                (!s.is_empty()).then(|| FieldValue::Text(s.to_string()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts "30", "६०००", "1,20,000"
fn parse_number(raw: &str) -> Option<f64> {
    let normalized: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .map(|c| match c {
            '०'..='९' => char::from(b'0' + (c as u32 - '०' as u32) as u8),
            other => other,
        })
        .collect();

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "होय" | "हो" => Some(true),
        "false" | "no" | "n" | "नाही" | "नाहि" => Some(false),
        _ => None,
    }
}

/// A profile value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Flag(_) => FieldKind::Flag,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Flag(true) => f.write_str("होय"),
            FieldValue::Flag(false) => f.write_str("नाही"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Flag(b) => serializer.serialize_bool(*b),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Partial user profile keyed by schema field.
///
/// Fields keep the order in which they were first stated; overwriting a
/// field keeps its position. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    fields: Vec<(ProfileField, FieldValue)>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and fixtures
    pub fn with(mut self, field: ProfileField, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Decode one raw entry; unknown keys, nulls and malformed values are dropped.
    fn insert_raw(&mut self, key: &str, raw: &Value) {
        let Some(field) = ProfileField::from_key(key) else {
            tracing::debug!("Dropping unknown profile key '{}'", key);
            return;
        };
        match field.decode(raw) {
            Some(value) => {
                self.insert(field, value);
            }
            None if raw.is_null() => {}
            None => tracing::debug!("Dropping malformed value for {}: {}", field, raw),
        }
    }

    pub fn get(&self, field: ProfileField) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: ProfileField) -> bool {
        self.get(field).is_some()
    }

    /// Set a field; an existing field is overwritten in place.
    pub fn insert(&mut self, field: ProfileField, value: FieldValue) -> Option<FieldValue> {
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.fields.push((field, value));
                None
            }
        }
    }

    pub fn remove(&mut self, field: ProfileField) -> Option<FieldValue> {
        let index = self.fields.iter().position(|(f, _)| *f == field)?;
        Some(self.fields.remove(index).1)
    }

    /// Overwrite existing keys and add new ones from `delta`.
    pub fn merge(&mut self, delta: &Profile) {
        for (field, value) in &delta.fields {
            self.insert(*field, value.clone());
        }
    }

    /// Entries in the order they were stated
    pub fn iter(&self) -> impl Iterator<Item = (ProfileField, &FieldValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    pub fn fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.fields.iter().map(|(f, _)| *f)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(field, value)| other.get(field) == Some(value))
    }
}

impl Serialize for Profile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// Reads entries straight off the map so the model's key order survives.
struct ProfileVisitor;

impl<'de> Visitor<'de> for ProfileVisitor {
    type Value = Profile;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a profile object or null")
    }

    fn visit_none<E: de::Error>(self) -> Result<Profile, E> {
        Ok(Profile::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Profile, E> {
        Ok(Profile::new())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Profile, D::Error> {
        deserializer.deserialize_map(self)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Profile, A::Error> {
        let mut profile = Profile::new();
        while let Some((key, raw)) = access.next_entry::<String, Value>()? {
            profile.insert_raw(&key, &raw);
        }
        Ok(profile)
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_option(ProfileVisitor)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Scheme reference kept in session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSummary {
    pub id: String,
    pub name: String,
}

/// Who said it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One line of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    /// RFC 3339
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Mutable state of one conversation
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: Uuid,
    pub phase: Phase,
    pub profile: Profile,
    pub eligible_schemes: Vec<SchemeSummary>,
    pub selected_scheme: Option<SchemeSummary>,
    pub missing_info: Vec<String>,
    pub conversation_history: Vec<HistoryEntry>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: Phase::Idle,
            profile: Profile::new(),
            eligible_schemes: Vec::new(),
            selected_scheme: None,
            missing_info: Vec::new(),
            conversation_history: Vec::new(),
        }
    }

    /// The last `n` history entries (fewer if the history is shorter)
    pub fn recent_history(&self, n: usize) -> &[HistoryEntry] {
        let start = self.conversation_history.len().saturating_sub(n);
        &self.conversation_history[start..]
    }

    /// Number of completed turns
    pub fn turn_count(&self) -> usize {
        self.conversation_history
            .iter()
            .filter(|e| e.role == Role::User)
            .count()
    }
}
