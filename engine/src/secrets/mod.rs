//! API key resolution and secret hygiene
//!
//! Cloud backends (groq, openrouter) need an API key. Keys are looked up in
//! this order:
//!
//! 1. `LLM_API_KEY` (applies to whichever provider is selected)
//! 2. The provider's own variable (`GROQ_API_KEY`, `OPENROUTER_API_KEY`)
//! 3. The OS keychain via `keyring` (service `sahayak`,
//!    entry `<provider>_api_key`)
//!
//! Resolved keys are wrapped in `SecretString`, which never prints its
//! contents. `scrub_secrets` strips key-shaped substrings from provider
//! error bodies before they reach the logs.

use keyring::Entry;
use regex::Regex;
use sdk::errors::EngineError;
use std::fmt;
use std::sync::OnceLock;

use crate::llm::ProviderKind;

/// Keychain service name
pub const KEYCHAIN_SERVICE: &str = "sahayak";

/// Provider-agnostic API key variable
pub const GENERIC_KEY_VAR: &str = "LLM_API_KEY";

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` always print `[REDACTED]`; use `expose()` at the
/// single point where the key goes on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Where a key was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Environment(String),
    Keychain,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Environment(var) => write!(f, "environment ({})", var),
            KeySource::Keychain => write!(f, "OS keychain"),
        }
    }
}

/// Resolves API keys from the environment and the OS keychain
pub struct ApiKeyResolver {
    service_name: String,
}

impl Default for ApiKeyResolver {
    fn default() -> Self {
        Self::new(KEYCHAIN_SERVICE)
    }
}

impl ApiKeyResolver {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Resolve the key for `kind` from the process environment, then the keychain.
    ///
    /// Returns `None` for providers that need no key, or when no key is
    /// configured anywhere. Keychain failures are logged and treated as
    /// "not found".
    pub fn resolve(&self, kind: ProviderKind) -> Option<(SecretString, KeySource)> {
        self.resolve_with(kind, |var| std::env::var(var).ok())
    }

    /// Same as `resolve`, with an injectable environment lookup.
    pub fn resolve_with<F>(&self, kind: ProviderKind, env: F) -> Option<(SecretString, KeySource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider_var = kind.api_key_env()?;

        for var in [GENERIC_KEY_VAR, provider_var] {
            if let Some(value) = env(var).filter(|v| !v.trim().is_empty()) {
                tracing::debug!("API key for {} taken from {}", kind, var);
                return Some((
                    SecretString::new(value.trim()),
                    KeySource::Environment(var.to_string()),
                ));
            }
        }

        match self.keychain_lookup(&format!("{}_api_key", kind)) {
            Ok(Some(value)) => Some((SecretString::new(value), KeySource::Keychain)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Keychain lookup failed: {}", e);
                None
            }
        }
    }

    /// Look up one keychain entry; a missing entry is `Ok(None)`.
    fn keychain_lookup(&self, key: &str) -> Result<Option<String>, EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved '{}' from keychain", key);
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve '{}': {}",
                key, e
            ))),
        }
    }
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns for key-shaped substrings:
/// - OpenAI / OpenRouter keys: sk-..., sk-or-v1-...
/// - Groq keys: gsk_...
/// - Bearer tokens
fn secret_patterns() -> &'static [Regex] {
    SECRET_PATTERNS.get_or_init(|| {
        [
            r"sk-[a-zA-Z0-9\-_]{20,}",
            r"gsk_[a-zA-Z0-9]{20,}",
            r"Bearer\s+[^\s]{20,}",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Replace every key-shaped substring with `[REDACTED]`.
///
/// # Examples
/// ```
/// use sahayak_engine::secrets::scrub_secrets;
///
/// let scrubbed = scrub_secrets("invalid key gsk_abcdefghijklmnopqrstuvwx");
/// assert_eq!(scrubbed, "invalid key [REDACTED]");
/// ```
pub fn scrub_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").into_owned();
    }
    result
}
