use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use catalog_storage_gc::{
    application::builder::ApplicationBuilder, logging, value_objects::EntityKind, Config,
};

/// Re-encode every referenced catalog image to WebP
#[derive(Parser)]
#[command(name = "optimize-images", version)]
struct Cli {
    /// Only process these record kinds (cafe, product, user, review)
    #[arg(long = "kind", value_delimiter = ',')]
    kinds: Vec<EntityKind>,

    /// WebP quality from 1 to 100
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Pause between two images in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Admin token checked before anything is uploaded
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
            error!("Image optimization failed: {:#}", e);
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
    if let Some(quality) = cli.quality {
        config.optimizer_quality = quality;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.optimizer_delay_ms = delay_ms;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let optimizer_config = config.optimizer_config().with_kinds(cli.kinds);
    info!(
        kinds = ?optimizer_config.kinds,
        quality = optimizer_config.quality,
        delay = ?Duration::from_millis(config.optimizer_delay_ms),
        "Configuration loaded and validated"
    );

    let token = config.admin_token.clone();
    let builder = ApplicationBuilder::new(config)
        .with_http_backend()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to set up the backend client")?;
    let optimizer = builder
        .build_optimizer(optimizer_config)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let stats = match optimizer.optimize_all(token.as_deref()).await {
        Ok(stats) => stats,
        Err(e) => {
            if let Some(partial) = e.partial_stats() {
                println!("{}", partial.summary());
                println!("{}", partial.details());
            }
            return Err(e.into());
        }
    };
    println!("{}", stats.summary());
    println!("{}", stats.details());

    if stats.failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
