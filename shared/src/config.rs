use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Settings for one family of workers (event or RPC).
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerPool {
    pub base_url: String,
    pub workers: usize,
    /// Requests per second, per worker.
    pub rate: f64,
}

pub struct Config {
    pub openapi_path: String,
    pub events: WorkerPool,
    pub rpc: WorkerPool,
    pub request_timeout: Duration,
}

impl Config {
    const DEFAULT_OPENAPI_PATH: &str = "openapi.yaml";
    const DEFAULT_BASE_URL: &str = "http://localhost:8080";
    const DEFAULT_RPC_URL: &str = "http://localhost:8081";
    const DEFAULT_TIMEOUT_SECS: u64 = 5;

    pub fn from_env() -> Self {
        Self {
            openapi_path: std::env::var("TRAFFIC_OPENAPI")
                .unwrap_or_else(|_| Self::DEFAULT_OPENAPI_PATH.to_string()),
            events: WorkerPool {
                base_url: std::env::var("TRAFFIC_BASE_URL")
                    .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string()),
                workers: env_or("TRAFFIC_WORKERS", 1),
                rate: env_or("TRAFFIC_RATE", 1.0),
            },
            rpc: WorkerPool {
                base_url: std::env::var("TRAFFIC_RPC_URL")
                    .unwrap_or_else(|_| Self::DEFAULT_RPC_URL.to_string()),
                workers: env_or("TRAFFIC_RPC_WORKERS", 0),
                rate: env_or("TRAFFIC_RPC_RATE", 1.0),
            },
            request_timeout: Duration::from_secs(env_or(
                "TRAFFIC_TIMEOUT_SECS",
                Self::DEFAULT_TIMEOUT_SECS,
            )),
        }
    }

    /// Rejects configurations that would start a run with nothing to do.
    pub fn validate(&self) -> Result<()> {
        if self.events.workers + self.rpc.workers == 0 {
            return Err(Error::Config(
                "at least one event or RPC worker is required".to_string(),
            ));
        }
        if self.events.workers > 0 && self.events.base_url.trim().is_empty() {
            return Err(Error::Config("event base URL is empty".to_string()));
        }
        if self.rpc.workers > 0 && self.rpc.base_url.trim().is_empty() {
            return Err(Error::Config("RPC base URL is empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{name}={raw:?} is not a valid value, using default {default}");
            default
        }),
        Err(_) => default,
    }
}
