// Sahayak voice assistant
// Main entry point for the sahayak binary

use clap::Parser;
use sdk::errors::{EngineError, SahayakErrorExt, GENERIC_APOLOGY};
use sahayak_engine::cli::{Cli, Command};
use sahayak_engine::config::Config;
use sahayak_engine::handlers::{handle_chat, handle_doctor, OutputFormat};
use sahayak_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("{:#}", e);

        println!("\n{}", GENERIC_APOLOGY);
        if let Some(hint) = e.downcast_ref::<EngineError>().map(|err| err.user_hint()) {
            println!("{}", hint);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_telemetry();
            return Err(e.into());
        }
    };

    // RUST_LOG still wins over the configured level
    init_telemetry_with_level(&config.core.log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::info!("Sahayak v{} ({} - {})", version, commit, timestamp);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.resolved_command() {
        Command::Chat => {
            config.validate()?;
            handle_chat(&config).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }
    }
}

/// File (or defaults), then flag/environment overrides.
fn load_config(cli: &Cli) -> Result<Config, EngineError> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_default()?,
    };
    config.apply_overrides(cli.provider.clone(), cli.model.clone());
    Ok(config)
}
