mod cli;

use clap::Parser;
use cli::{Cli, Command, RunArgs, VerifyArgs};
use shared::config::Config;
use std::time::Duration;
use trafficgen::verify::{Verifier, standard_checks};
use trafficgen::{Catalog, Orchestrator};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Verify(args) => verify(args).await,
    }
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env();
    args.apply(&mut config);
    config.validate()?;

    // ============================================
    // STEP 1: Load examples from the API description
    // ============================================
    info!("Loading API description from {}", config.openapi_path);
    let catalog = match Catalog::from_path(&config.openapi_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    };
    info!(
        "Found {} POST endpoints with examples: {}",
        catalog.len(),
        catalog.paths().join(", ")
    );

    // ============================================
    // STEP 2: Spawn workers and wait for shutdown
    // ============================================
    let shutdown = shutdown_signal()?;
    let summary = Orchestrator::new(catalog, &config).run(shutdown).await?;

    summary.log();
    info!("Traffic generator stopped");
    Ok(())
}

async fn verify(args: VerifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let verifier = Verifier::new(&args.base_url, Duration::from_secs(args.timeout_secs))?;
    let report = verifier
        .run(&standard_checks(chrono::Utc::now().timestamp()))
        .await;

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

// Handlers are installed when this is called, not when the returned future is first polled,
// so a signal that lands while workers are still being spawned is not lost. They stay
// installed afterwards: a second interrupt while stopping changes nothing.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {
                info!("Received Ctrl+C signal");
            },
            _ = terminate.recv() => {
                info!("Received terminate signal");
            },
        }
    })
}

#[cfg(windows)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
        info!("Received Ctrl+C signal");
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_before_first_poll_is_caught() {
        let shutdown = shutdown_signal().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .unwrap();
    }
}
