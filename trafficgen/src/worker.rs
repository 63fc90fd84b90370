use crate::ports::{PlannedRequest, RequestKind, RequestOutcome, Transport, Workload};
use crate::transport::join_url;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Longest period a worker will wait between requests; keeps far-future deadlines representable.
const MAX_INTERVAL: Duration = Duration::from_secs(u32::MAX as u64);

/// Fixed at spawn time.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub name: String,
    /// Requests per second.
    pub rate: f64,
    pub base_url: String,
}

impl WorkerConfig {
    pub fn new(name: impl Into<String>, rate: f64, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate,
            base_url: base_url.into(),
        }
    }

    /// Time between request starts. Non-positive (or non-finite) rates fall back to one second;
    /// vanishingly small rates saturate at `MAX_INTERVAL`.
    pub fn interval(&self) -> Duration {
        if self.rate.is_finite() && self.rate > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.rate)
                .unwrap_or(MAX_INTERVAL)
                .clamp(Duration::from_micros(1), MAX_INTERVAL)
        } else {
            Duration::from_secs(1)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerReport {
    pub name: String,
    pub sent: u64,
    pub failed: u64,
}

pub struct Worker<W, T> {
    config: WorkerConfig,
    workload: W,
    transport: T,
    rng: StdRng,
}

impl<W: Workload, T: Transport> Worker<W, T> {
    pub fn new(config: WorkerConfig, workload: W, transport: T) -> Self {
        Self::with_rng(config, workload, transport, StdRng::from_os_rng())
    }

    pub fn with_rng(config: WorkerConfig, workload: W, transport: T, rng: StdRng) -> Self {
        Self {
            config,
            workload,
            transport,
            rng,
        }
    }

    /// Issue requests at the configured rate until `stop` is cancelled.
    ///
    /// Requests are strictly sequential. An in-flight call is allowed to finish (bounded by
    /// the transport timeout); a stop during the wait between calls exits right away.
    pub async fn run(mut self, stop: CancellationToken) -> WorkerReport {
        let mut report = WorkerReport {
            name: self.config.name.clone(),
            ..Default::default()
        };

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            worker = %self.config.name,
            mode = self.workload.mode(),
            rate = self.config.rate,
            target = %self.config.base_url,
            "worker started"
        );

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let request = self.workload.next_request(&mut self.rng);
            let url = join_url(&self.config.base_url, &request.path);
            let outcome = self
                .transport
                .post(&url, &request.body, request.wants_body_preview())
                .await;

            report.sent += 1;
            if outcome.is_failure() {
                report.failed += 1;
            }
            log_outcome(&self.config.name, &request, &outcome);

            if stop.is_cancelled() {
                break;
            }
        }

        info!(
            worker = %report.name,
            sent = report.sent,
            failed = report.failed,
            "worker stopped"
        );
        report
    }
}

fn log_outcome(worker: &str, request: &PlannedRequest, outcome: &RequestOutcome) {
    match (&request.kind, outcome) {
        (RequestKind::Event, RequestOutcome::Response { status, reason, .. }) => {
            info!(worker, "POST {} -> {} ({})", request.path, status, reason);
        }
        (RequestKind::Event, RequestOutcome::Failed(e)) => {
            warn!(worker, "ERROR POST {} -> {}", request.path, e);
        }
        (
            RequestKind::Rpc { method, id },
            RequestOutcome::Response {
                status,
                reason,
                preview,
            },
        ) => {
            info!(
                worker,
                id,
                "RPC {} -> {} ({}) {}",
                method,
                status,
                reason,
                preview.as_deref().unwrap_or("")
            );
        }
        (RequestKind::Rpc { method, id }, RequestOutcome::Failed(e)) => {
            warn!(worker, id, "ERROR RPC {} -> {}", method, e);
        }
    }
}
