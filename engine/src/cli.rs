//! CLI interface for Sahayak
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sahayak: Marathi voice assistant for government schemes
///
/// Talks with the user in Marathi, collects their details and tells them
/// which welfare schemes they qualify for and how to apply.
#[derive(Parser, Debug)]
#[command(name = "sahayak")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// LLM backend (groq, ollama, openrouter)
    #[arg(long, global = true, env = "LLM_PROVIDER", value_name = "NAME")]
    pub provider: Option<String>,

    /// Model to request from the backend
    #[arg(long, global = true, env = "LLM_MODEL", value_name = "NAME")]
    pub model: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output in JSON format (doctor)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run; `chat` when none was given
    pub fn resolved_command(&self) -> Command {
        self.command.unwrap_or(Command::Chat)
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a conversation (default)
    Chat,

    /// Check configuration, API key and provider health
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_chat() {
        let cli = Cli::parse_from(["sahayak"]);
        assert_eq!(cli.resolved_command(), Command::Chat);
    }

    #[test]
    fn test_doctor_with_global_flags() {
        let cli = Cli::parse_from([
            "sahayak",
            "doctor",
            "--provider",
            "ollama",
            "--model",
            "llama3.1",
            "--json",
        ]);
        assert_eq!(cli.resolved_command(), Command::Doctor);
        assert_eq!(cli.provider.as_deref(), Some("ollama"));
        assert_eq!(cli.model.as_deref(), Some("llama3.1"));
        assert!(cli.json);
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["sahayak", "--config", "/tmp/sahayak.toml", "chat"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/sahayak.toml")));
        assert_eq!(cli.resolved_command(), Command::Chat);
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["sahayak", "start"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
