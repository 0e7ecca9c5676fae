//! Subcommand implementations.

use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use facegate_engine::{AccessController, Devices, EngineError};
use facegate_hardware::fixture::{FixtureAnalyzer, FixtureCamera};
use facegate_storage::{
    AccessLog, AccessLogRepository, AccessOutcome, CredentialRepository, Database, DatabaseConfig,
    EnrollmentSummary, SqliteAccessLogRepository, SqliteCredentialRepository,
};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::terminal::{LineKeypad, LineSource, LoggedOutputs, SimulatedRanger, TerminalConsole};

async fn open_database(config: &AppConfig) -> Result<Database> {
    let path = &config.storage.database_path;
    Database::new(DatabaseConfig::new(path))
        .await
        .with_context(|| format!("Failed to open credential database {}", path.display()))
}

/// Run the access controller on emulated devices until Ctrl-C or end of
/// operator input.
pub async fn run(config: &AppConfig) -> Result<()> {
    run_with(config, LineSource::stdin(), tokio::signal::ctrl_c()).await
}

/// Run the controller with operator input from `input` until `shutdown`
/// resolves. Returns without waiting for a pending line.
pub async fn run_with<F>(config: &AppConfig, input: LineSource, shutdown: F) -> Result<()>
where
    F: Future,
{
    let db = open_database(config).await?;

    let ranger = match config.devices.simulated_distance_cm {
        Some(cm) => SimulatedRanger::Fixed(cm),
        None => {
            println!("Press Enter when a visitor approaches.");
            SimulatedRanger::Operator(input.clone())
        }
    };
    let devices = Devices {
        ranger,
        keypad: LineKeypad::new(input.clone()),
        outputs: LoggedOutputs::new(),
        camera: FixtureCamera::new(config.devices.fixtures_dir.clone()),
        analyzer: FixtureAnalyzer::new(),
    };

    let mut controller = AccessController::new(
        devices,
        TerminalConsole::new(input),
        SqliteCredentialRepository::new(db.pool().clone()),
        SqliteAccessLogRepository::new(db.pool().clone()),
        config.controller_config(),
    )?;

    let result = controller.run_until(shutdown).await;
    db.close().await;

    match result {
        Ok(()) => Ok(()),
        Err(EngineError::InputClosed) => {
            info!("Operator input closed");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn format_enrollment(summary: &EnrollmentSummary) -> String {
    format!(
        "{:<24} {:>5}  {}{}",
        summary.name,
        summary.dimension,
        summary.enrolled_at.format("%Y-%m-%d %H:%M:%S"),
        if summary.has_code { "" } else { "  (no code)" }
    )
}

/// Print enrolled identities, oldest first. Codes are never shown.
pub async fn list(config: &AppConfig) -> Result<()> {
    let db = open_database(config).await?;
    let enrollments = SqliteCredentialRepository::new(db.pool().clone())
        .list()
        .await?;
    db.close().await;

    if enrollments.is_empty() {
        println!("No faces have been registered yet.");
        return Ok(());
    }
    println!("{:<24} {:>5}  ENROLLED (UTC)", "NAME", "DIM");
    for summary in &enrollments {
        println!("{}", format_enrollment(summary));
    }
    Ok(())
}

pub fn format_log_entry(entry: &AccessLog) -> String {
    format!(
        "{}  {:<8} {:<20} {:<16} {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.workflow.as_deref().unwrap_or("-"),
        entry.outcome,
        entry.identity.as_deref().unwrap_or("-"),
        entry.message
    )
}

/// Print recent access log entries, newest first.
pub async fn log(
    config: &AppConfig,
    limit: i64,
    identity: Option<&str>,
    outcome: Option<&str>,
) -> Result<()> {
    let outcome = outcome
        .map(|o| AccessOutcome::parse(o).ok_or_else(|| anyhow!("Unknown outcome: {o}")))
        .transpose()?;

    let db = open_database(config).await?;
    let logs = SqliteAccessLogRepository::new(db.pool().clone());
    let entries = match (identity, outcome) {
        (Some(identity), _) => {
            let entries = logs.find_by_identity(identity, limit).await?;
            match outcome {
                Some(outcome) => entries
                    .into_iter()
                    .filter(|e| e.get_outcome() == Some(outcome))
                    .collect(),
                None => entries,
            }
        }
        (None, Some(outcome)) => logs.find_by_outcome(outcome, limit).await?,
        (None, None) => logs.find_recent(limit).await?,
    };
    db.close().await;

    if entries.is_empty() {
        println!("No access log entries.");
    }
    for entry in &entries {
        println!("{}", format_log_entry(entry));
    }
    Ok(())
}

/// Validate the configuration and print it with defaults filled in.
pub fn check_config(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    config.validate()?;
    if !config.devices.fixtures_dir.is_dir() {
        warn!(
            dir = %config.devices.fixtures_dir.display(),
            "Fixture directory does not exist"
        );
    }

    match path {
        Some(path) => println!("# {} is valid", path.display()),
        None => println!("# Configuration is valid"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
