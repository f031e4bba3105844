//! Integration tests for configuration management
//!
//! Config files are written to temporary directories and loaded through the
//! same path the binary uses: file, then overrides, then validation.

use sahayak_engine::config::Config;
use sahayak_engine::llm::ProviderKind;
use sdk::errors::{EngineError, SahayakErrorExt};
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_full_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[core]
log_level = "debug"

[llm]
provider = "openrouter"
request_timeout_secs = 15

[llm.groq]
base_url = "https://api.groq.com/openai/v1"
model = "llama-3.3-70b-versatile"

[llm.ollama]
base_url = "http://localhost:11434"
model = "llama3.2"

[llm.openrouter]
base_url = "https://openrouter.ai/api/v1"
model = "meta-llama/llama-3.3-70b-instruct"

[voice]
tts_command = "espeak-ng -v mr"
tts_timeout_secs = 10
"#,
    );

    let config = Config::load_from_path(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.llm.kind().unwrap(), ProviderKind::OpenRouter);
    assert_eq!(
        config.llm.resolved_model().unwrap(),
        "meta-llama/llama-3.3-70b-instruct"
    );
    assert_eq!(config.llm.request_timeout(), Duration::from_secs(15));
    assert_eq!(config.voice.tts_command.as_deref(), Some("espeak-ng -v mr"));
    assert_eq!(config.voice.tts_timeout(), Duration::from_secs(10));
}

#[test]
fn test_overrides_beat_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[llm]
provider = "groq"
model = "from-file"
"#,
    );

    let mut config = Config::load_from_path(&path).unwrap();
    config.apply_overrides(Some("Ollama".to_string()), Some("llama3.2:1b".to_string()));
    config.validate().unwrap();

    assert_eq!(config.llm.kind().unwrap(), ProviderKind::Ollama);
    assert_eq!(config.llm.resolved_model().unwrap(), "llama3.2:1b");
}

#[test]
fn test_file_model_beats_backend_default() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[llm]
model = "from-file"
"#,
    );

    let mut config = Config::load_from_path(&path).unwrap();
    config.apply_overrides(None, Some(String::new()));
    assert_eq!(config.llm.resolved_model().unwrap(), "from-file");
}

#[test]
fn test_unknown_provider_fails_fast() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[llm]
provider = "gpt-x"
"#,
    );

    // Loading succeeds; validation is what rejects it
    let config = Config::load_from_path(&path).unwrap();
    let err = config.validate().unwrap_err();

    assert!(matches!(err, EngineError::UnsupportedProvider(_)));
    assert!(!err.is_recoverable());
    assert!(!err.user_hint().contains("gpt-x"));
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[llm\nprovider = ");

    assert!(matches!(
        Config::load_from_path(&path),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    assert!(matches!(
        Config::load_from_path(&path),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn test_saved_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.llm.provider = "ollama".to_string();
    config.voice.tts_command = Some("say -v Lekha".to_string());

    let path = write_config(&dir, &toml::to_string(&config).unwrap());
    let loaded = Config::load_from_path(&path).unwrap();

    assert_eq!(loaded.llm.provider, "ollama");
    assert_eq!(loaded.voice.tts_command, config.voice.tts_command);
    assert_eq!(loaded.llm.request_timeout_secs, 8);
}
