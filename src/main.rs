// Main entrypoint for the checkpoint/restore migration manager.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use cmmanager::app;
use cmmanager::config::{Config, ConfigTrait};
use cmmanager::controller::metrics::init_prometheus_exporter;
use cmmanager::shutdown::GracefulShutdown;

const CONFIG_PATH: &str = "cfg/cmmanager.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/cmmanager.cfg.local.yaml";
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// cmmanager - control plane for checkpoint/restore live migration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Worker list file, one `<id> <addr>` per line
    #[arg(short, long, value_name = "FILE")]
    workers: Option<PathBuf>,

    /// Service list file, one `<name> <image>` per line
    #[arg(short, long, value_name = "FILE")]
    services: Option<PathBuf>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, custom_path));
    }

    // Try local config first
    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok((cfg, PathBuf::from(CONFIG_PATH_LOCAL))),
        Err(_) => {
            // Fall back to default config
            let cfg = Config::load(PathBuf::from(CONFIG_PATH))
                .with_context(|| format!("failed to load config from {}", CONFIG_PATH))?;
            Ok((cfg, PathBuf::from(CONFIG_PATH)))
        }
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut cfg, cfg_path) = load_cfg(args.cfg)?;
    cfg.override_seed(args.workers, args.services);

    // Configure logger (must be done after config is loaded)
    configure_logger(&cfg);
    info!(
        component = "config",
        event = "load_success",
        path = ?cfg_path,
        "config loaded"
    );

    // Initialize Prometheus metrics exporter BEFORE tokio runtime starts
    if cfg.metrics_enabled() {
        if let Err(e) = init_prometheus_exporter() {
            warn!(
                component = "main",
                event = "metrics_init_failed",
                error = %e,
                "metrics endpoint will be empty"
            );
        }
    }

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<()> {
    // Create cancellation token for graceful shutdown
    let shutdown_token = CancellationToken::new();

    let graceful_shutdown = Arc::new(GracefulShutdown::new(shutdown_token.clone(), GRACEFUL_TIMEOUT));

    let app = app::App::new(shutdown_token.clone(), cfg).await?;
    if let Err(e) = app.serve(graceful_shutdown.clone()).await {
        error!(
            component = "main",
            scope = "app",
            event = "start_failed",
            error = %e,
            "failed to start app"
        );
        shutdown_token.cancel();
    }

    // Listen for OS signals or cancellation and wait for graceful shutdown
    if let Err(e) = graceful_shutdown.await_shutdown().await {
        error!(
            component = "main",
            scope = "service",
            event = "graceful_shutdown_failed",
            error = %e,
            "failed to gracefully shut down service"
        );
        return Err(e);
    }

    Ok(())
}
