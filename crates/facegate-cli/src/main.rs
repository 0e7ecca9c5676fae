//! `facegate`: face plus PIN door access controller.
//!
//! `facegate run` drives the controller from the terminal: a fixture
//! directory stands in for the camera, typed lines for the keypad, and the
//! indicator and lock actuator are logged.

mod commands;
mod config;
mod terminal;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "facegate")]
#[command(about = "Face and PIN door access controller")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./facegate.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the access controller until Ctrl-C
    Run,
    /// List enrolled identities
    List,
    /// Show recent access log entries
    Log {
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
        /// Only entries for this identity
        #[arg(short, long)]
        identity: Option<String>,
        /// Only entries with this outcome (e.g. granted, denied, no_match)
        #[arg(short, long)]
        outcome: Option<String>,
    },
    /// Validate the configuration and print the effective settings
    CheckConfig,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    setup_logging(&config.logging.level);

    match cli.command {
        Commands::Run => {
            info!(
                database = %config.storage.database_path.display(),
                fixtures = %config.devices.fixtures_dir.display(),
                "Starting facegate"
            );
            commands::run(&config).await?;
        }
        Commands::List => commands::list(&config).await?,
        Commands::Log {
            limit,
            identity,
            outcome,
        } => {
            commands::log(&config, limit, identity.as_deref(), outcome.as_deref()).await?;
        }
        Commands::CheckConfig => commands::check_config(&config, cli.config.as_deref())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_log_filters() {
        let cli = Cli::parse_from([
            "facegate", "--config", "site.toml", "log", "-n", "5", "--outcome", "granted",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        match cli.command {
            Commands::Log {
                limit,
                identity,
                outcome,
            } => {
                assert_eq!(limit, 5);
                assert_eq!(identity, None);
                assert_eq!(outcome.as_deref(), Some("granted"));
            }
            _ => panic!("expected log command"),
        }
    }

    #[test]
    fn test_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["facegate", "check-config", "--config", "x.toml"]);

        assert!(matches!(cli.command, Commands::CheckConfig));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
