use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use catalog_storage_gc::{
    application::{builder::ApplicationBuilder, gc::RunMode},
    infrastructure::prompt::StdinConfirmation,
    logging, Config,
};

/// Find and remove stored blobs that no catalog record references
#[derive(Parser)]
#[command(name = "storage-gc", version)]
struct Cli {
    /// Delete the dangling blobs after confirmation (default is a dry run)
    #[arg(long)]
    delete: bool,

    /// Only report storage usage; no reconciliation
    #[arg(long, conflicts_with = "delete")]
    stats: bool,

    /// Admin token checked before any deletion
    #[arg(long, env = "STORAGE_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Optional TOML config file; environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Storage GC failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::from_env(),
    };
    if let Some(token) = cli.token {
        config.admin_token = Some(token);
    }
    config.validate().map_err(anyhow::Error::msg)?;
    info!(config = ?config, "Configuration loaded and validated");

    let token = config.admin_token.clone();
    let builder = ApplicationBuilder::new(config)
        .with_http_backend()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to set up the backend client")?;
    let gc = builder
        .build_gc()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if cli.stats {
        let stats = gc.storage_stats().await?;
        println!("{}", stats.summary());
        println!("{}", stats.details());
        return Ok(ExitCode::SUCCESS);
    }

    let mode = if cli.delete {
        RunMode::Delete
    } else {
        RunMode::DryRun
    };
    let summary = match gc.run(mode, token.as_deref(), &StdinConfirmation).await {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(partial) = e.partial_summary() {
                println!("{}", partial.summary());
                println!("{}", partial.details());
            }
            return Err(e.into());
        }
    };

    println!("{}", summary.summary());
    println!("{}", summary.details());

    if summary.failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
