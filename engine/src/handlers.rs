//! Command handlers for CLI operations
//!
//! - chat: run one conversation over the console
//! - doctor: validate configuration and check the LLM backend

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;

use crate::agent::AgentCore;
use crate::config::Config;
use crate::llm::{self, LLMProvider};
use crate::secrets::{ApiKeyResolver, SecretString};
use crate::voice::{CommandSpeaker, ConsoleInput, ConsoleOutput};
use sdk::voice::VoiceOutput;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run an interactive session.
///
/// The config must already be validated. Construction errors (bad provider,
/// unusable HTTP client, empty TTS command) stop here before the first turn.
pub async fn handle_chat(config: &Config) -> Result<()> {
    let provider = build_provider(config, &ApiKeyResolver::default())?;

    let core = AgentCore::new(provider, config.llm.request_timeout());
    let output: Box<dyn VoiceOutput> = match config.voice.tts_command.as_deref() {
        Some(command) => {
            let speaker = CommandSpeaker::from_command_line(command, config.voice.tts_timeout())?;
            tracing::info!(component = "voice", "Speaking through {}", speaker.program());
            Box::new(speaker)
        }
        None => Box::new(ConsoleOutput::new()),
    };
    let mut input = ConsoleInput::stdin();

    let state = core
        .run(&mut input, output.as_ref())
        .await
        .context("Session failed")?;

    tracing::info!(
        session = %state.session_id,
        turns = state.turn_count(),
        phase = %state.phase,
        "Session finished"
    );
    Ok(())
}

/// Resolve the API key and build the configured backend.
///
/// A missing key for a cloud backend is only a warning; requests will then
/// fail with an authentication error and every step falls back.
pub fn build_provider(config: &Config, resolver: &ApiKeyResolver) -> Result<Arc<dyn LLMProvider>> {
    let kind = config.llm.kind()?;

    let api_key: Option<SecretString> = match resolver.resolve(kind) {
        Some((key, source)) => {
            tracing::debug!("API key for {} loaded from {}", kind, source);
            Some(key)
        }
        None => {
            if kind.requires_api_key() {
                tracing::warn!(
                    "No API key for {}. Set LLM_API_KEY or {} (or store {}_api_key in the keychain).",
                    kind,
                    kind.api_key_env().unwrap_or("LLM_API_KEY"),
                    kind
                );
            }
            None
        }
    };

    Ok(llm::from_config(&config.llm, api_key)?)
}

/// Validate configuration and check the backend
///
/// Checks:
/// - configuration values
/// - API key availability
/// - provider reachability (`check_health`)
/// - TTS command, if configured
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(&str, String)> = Vec::new();

    // Check 1: Configuration validation
    match config.validate() {
        Ok(()) => checks.push(("Configuration", "Valid".to_string())),
        Err(e) => {
            checks.push(("Configuration", "Invalid".to_string()));
            issues.push(e.to_string());
        }
    }

    // Check 2: Provider and model
    let kind = match config.llm.kind() {
        Ok(kind) => {
            checks.push(("Provider", kind.to_string()));
            Some(kind)
        }
        Err(e) => {
            checks.push(("Provider", "Unsupported".to_string()));
            issues.push(e.to_string());
            None
        }
    };

    if let Ok(model) = config.llm.resolved_model() {
        checks.push(("Model", model));
    }
    checks.push((
        "Request timeout",
        format!("{}s", config.llm.request_timeout_secs),
    ));

    // Check 3: API key
    let resolver = ApiKeyResolver::default();
    if let Some(kind) = kind {
        match resolver.resolve(kind) {
            Some((_, source)) => checks.push(("API key", format!("Found in {}", source))),
            None if kind.requires_api_key() => {
                checks.push(("API key", "Missing".to_string()));
                issues.push(format!(
                    "No API key for {}. Set LLM_API_KEY or {}.",
                    kind,
                    kind.api_key_env().unwrap_or("LLM_API_KEY")
                ));
            }
            None => checks.push(("API key", "Not needed".to_string())),
        }
    }

    // Check 4: Provider health
    if kind.is_some() {
        match build_provider(config, &resolver) {
            Ok(provider) => {
                if provider.check_health().await {
                    checks.push(("Provider health", "Reachable".to_string()));
                } else {
                    checks.push(("Provider health", "Unreachable".to_string()));
                    issues.push(format!(
                        "{} is not reachable. Every turn will use fallback replies.",
                        provider.name()
                    ));
                }
            }
            Err(e) => {
                checks.push(("Provider health", "Not built".to_string()));
                issues.push(format!("Cannot build provider: {}", e));
            }
        }
    }

    // Check 5: Text to speech
    match config.voice.tts_command.as_deref() {
        Some(command) => {
            match CommandSpeaker::from_command_line(command, config.voice.tts_timeout()) {
                Ok(speaker) => checks.push(("TTS command", speaker.program().to_string())),
                Err(e) => {
                    checks.push(("TTS command", "Invalid".to_string()));
                    issues.push(e.to_string());
                }
            }
        }
        None => checks.push(("TTS command", "Not configured (text only)".to_string())),
    }

    // Output results
    match format {
        OutputFormat::Text => {
            println!("Sahayak Diagnostics");
            println!("============================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
