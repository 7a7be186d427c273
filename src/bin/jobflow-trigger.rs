//! # Jobflow Trigger Runner
//!
//! Command invoked by the cron scheduler for each process trigger:
//!
//! ```text
//! jobflow-trigger handle <process-name> --id=<trigger id>
//! jobflow-trigger rebuild [process-name]
//! ```
//!
//! `handle` exits with status 0 when the trigger committed and 1 otherwise.
//! `rebuild` reloads the triggers and writes the crontab that runs them, to
//! stdout or to `--output`. Trigger ids change on every rebuild, so the
//! crontab must be reinstalled afterwards.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use jobflow_core::config::ConfigManager;
use jobflow_core::database;
use jobflow_core::logging;
use jobflow_core::scheduler::{
    render_crontab, CronScheduler, InMemoryCronScheduler, TriggerScheduleRegistrar,
};
use jobflow_core::triggers::{
    exit_status, EnqueueRootJobHandler, PgTriggerRepository, PgUnitOfWork, TriggerExecutor,
    TriggerRepository, EXIT_FAILURE,
};

#[derive(Parser)]
#[command(name = "jobflow-trigger")]
#[command(about = "Run and register jobflow process triggers")]
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
    /// Execute one trigger of a process
    Handle {
        /// Process the trigger belongs to
        process_name: String,

        /// Trigger id; anything but a positive integer is rejected
        #[arg(long)]
        id: Option<String>,
    },

    /// Reload trigger definitions from configuration and emit the crontab
    Rebuild {
        /// Only rebuild this process; the others keep their stored triggers
        process_name: Option<String>,

        /// Write the crontab to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
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
            return ExitCode::from(EXIT_FAILURE as u8);
        }
    };
    logging::init_with_config(&manager.config().logging);

    match cli.command {
        Commands::Handle { process_name, id } => {
            match handle(&manager, &process_name, id.as_deref()).await {
                Ok(code) => ExitCode::from(code as u8),
                Err(e) => {
                    error!(error = %e, "Trigger runner failed");
                    ExitCode::from(EXIT_FAILURE as u8)
                }
            }
        }
        Commands::Rebuild {
            process_name,
            output,
        } => {
            match rebuild(&manager, process_name.as_deref(), output.as_deref()).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "Trigger rebuild failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn handle(
    manager: &ConfigManager,
    process_name: &str,
    raw_trigger_id: Option<&str>,
) -> anyhow::Result<i32> {
    let pool = database::connect(&manager.config().database)
        .await
        .context("connecting to the database")?;

    let repository: Arc<dyn TriggerRepository> = Arc::new(PgTriggerRepository::new(pool.clone()));
    let executor = TriggerExecutor::new(
        repository,
        PgUnitOfWork::new(pool),
        EnqueueRootJobHandler::new(),
    );

    let result = executor.execute(process_name, raw_trigger_id).await;
    match &result {
        Ok(report) => info!(
            trigger_id = report.trigger_id,
            phases = ?report.phases,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Trigger handled"
        ),
        Err(e) => error!(
            process_name = %process_name,
            error = %e,
            retryable = e.is_retryable(),
            "Trigger handling failed"
        ),
    }
    Ok(exit_status(&result))
}

async fn rebuild(
    manager: &ConfigManager,
    process_name: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = manager.config();
    let pool = database::connect(&config.database)
        .await
        .context("connecting to the database")?;

    let scheduler = Arc::new(InMemoryCronScheduler::new());
    let registrar = TriggerScheduleRegistrar::new(
        Arc::new(PgTriggerRepository::new(pool)),
        scheduler.clone(),
        config.triggers.command_name.clone(),
    );

    let summaries = match process_name {
        Some(name) => {
            let definitions = config
                .triggers
                .definitions
                .get(name)
                .cloned()
                .unwrap_or_default();
            let summary = registrar.rebuild(name, definitions).await?;
            for other in config.triggers.definitions.keys().filter(|other| *other != name) {
                registrar.schedule_stored(other).await?;
            }
            vec![summary]
        }
        None => registrar.rebuild_all(&config.triggers).await?,
    };

    for summary in &summaries {
        info!(
            process_name = %summary.process_name,
            removed = summary.removed,
            stored = summary.stored.len(),
            scheduled = summary.scheduled,
            "Process triggers rebuilt"
        );
    }

    let entries = scheduler.entries().await?;
    let crontab = render_crontab(&entries, &config.triggers.program);
    match output {
        Some(path) => {
            tokio::fs::write(path, &crontab)
                .await
                .with_context(|| format!("writing crontab to {}", path.display()))?;
            info!(path = %path.display(), entries = entries.len(), "Crontab written");
        }
        None => print!("{crontab}"),
    }
    Ok(())
}
