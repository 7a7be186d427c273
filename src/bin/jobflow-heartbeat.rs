//! # Jobflow Consumer Heartbeat
//!
//! `check` runs the consumer heartbeat check once, for use from cron.
//! `watch` runs it on the configured period until interrupted.
//! `tick` records a heartbeat for a consumer, e.g. from a wrapper script.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

use jobflow_core::config::ConfigManager;
use jobflow_core::database;
use jobflow_core::heartbeat::{
    spawn_heartbeat_check, ConsumerHeartbeat, ConsumerHeartbeatCheck, PgConnectivityProbe,
    PgConsumerHeartbeat, PgNotifyPublisher,
};
use jobflow_core::logging;

#[derive(Parser)]
#[command(name = "jobflow-heartbeat")]
#[command(about = "Consumer heartbeat tooling")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration directory (default: config, or JOBFLOW_CONFIG_DIR)
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the check once
    Check,
    /// Run the check on every update period until Ctrl-C
    Watch,
    /// Record a heartbeat for one consumer
    Tick {
        /// Consumer identifier; a random one is generated when omitted
        #[arg(long)]
        consumer_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let manager = match ConfigManager::load_from_directory(cli.config_dir.clone()) {
        Ok(manager) => manager,
        Err(e) => {
            logging::init_structured_logging();
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    logging::init_with_config(&manager.config().logging);

    let result = match cli.command {
        Commands::Check => check_once(&manager).await,
        Commands::Watch => watch_forever(&manager).await,
        Commands::Tick { consumer_id } => tick(&manager, consumer_id).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Heartbeat command failed");
            ExitCode::FAILURE
        }
    }
}

async fn build_check(manager: &ConfigManager) -> anyhow::Result<ConsumerHeartbeatCheck> {
    let config = manager.config();
    let pool = database::connect(&config.database)
        .await
        .context("connecting to the database")?;
    let period = config.heartbeat.update_period().unwrap_or_default();

    Ok(ConsumerHeartbeatCheck::from_config(
        &config.heartbeat,
        Arc::new(PgConsumerHeartbeat::new(pool.clone(), period)),
        Arc::new(PgConnectivityProbe::new(pool.clone())),
        Arc::new(PgNotifyPublisher::new(pool)),
    ))
}

async fn check_once(manager: &ConfigManager) -> anyhow::Result<()> {
    let outcome = build_check(manager).await?.run().await?;
    info!(outcome = ?outcome, "Consumer heartbeat check finished");
    Ok(())
}

async fn watch_forever(manager: &ConfigManager) -> anyhow::Result<()> {
    let Some(period) = manager.config().heartbeat.update_period() else {
        info!("Consumer heartbeat check disabled; nothing to watch");
        return Ok(());
    };

    let check = Arc::new(build_check(manager).await?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_heartbeat_check(check, period, shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown requested");

    // Receiver may already be gone if the loop exited
    let _ = shutdown_tx.send(true);
    handle.await.context("joining heartbeat check loop")?;
    Ok(())
}

async fn tick(manager: &ConfigManager, consumer_id: Option<String>) -> anyhow::Result<()> {
    let config = manager.config();
    let pool = database::connect(&config.database)
        .await
        .context("connecting to the database")?;
    let heartbeat = PgConsumerHeartbeat::new(pool, config.heartbeat.update_period().unwrap_or_default());

    let consumer_id = consumer_id.unwrap_or_else(|| format!("consumer-{}", Uuid::new_v4()));
    heartbeat.tick(&consumer_id).await?;
    info!(consumer_id = %consumer_id, "Heartbeat recorded");
    Ok(())
}
