use clap::{Args, Parser, Subcommand};
use shared::config::Config;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "trafficgen")]
#[command(about = "OpenAPI-based infinite request generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate traffic until interrupted
    Run(RunArgs),
    /// Run the fixed smoke-check sequence against an ingestion service
    Verify(VerifyArgs),
}

/// Flags left unset keep the value from the environment (TRAFFIC_*) or its default.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// OpenAPI description (YAML or JSON)
    #[arg(long, short = 'o')]
    pub openapi: Option<String>,

    /// Event-ingestion base URL
    #[arg(long, short = 'u')]
    pub base_url: Option<String>,

    /// JSON-RPC base URL
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Number of concurrent event workers
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Requests per second per event worker
    #[arg(long, short = 'r')]
    pub rate: Option<f64>,

    /// Number of concurrent RPC workers
    #[arg(long)]
    pub rpc_workers: Option<usize>,

    /// Requests per second per RPC worker
    #[arg(long)]
    pub rpc_rate: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl RunArgs {
    pub fn apply(self, config: &mut Config) {
        if let Some(openapi) = self.openapi {
            config.openapi_path = openapi;
        }
        if let Some(base_url) = self.base_url {
            config.events.base_url = base_url;
        }
        if let Some(rpc_url) = self.rpc_url {
            config.rpc.base_url = rpc_url;
        }
        if let Some(workers) = self.workers {
            config.events.workers = workers;
        }
        if let Some(rate) = self.rate {
            config.events.rate = rate;
        }
        if let Some(workers) = self.rpc_workers {
            config.rpc.workers = workers;
        }
        if let Some(rate) = self.rpc_rate {
            config.rpc.rate = rate;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
    }
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Event-ingestion base URL
    #[arg(long, short = 'u', default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,
}
