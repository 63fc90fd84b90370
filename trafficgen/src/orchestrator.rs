use crate::catalog::Catalog;
use crate::ports::{Transport, Workload};
use crate::rpc::CallIdAllocator;
use crate::transport::HttpTransport;
use crate::worker::{Worker, WorkerConfig, WorkerReport};
use crate::workload::{EventWorkload, RpcWorkload};
use shared::Result;
use shared::config::{Config, WorkerPool};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Spawns the event and RPC worker pools and owns the stop token and call-id allocator.
pub struct Orchestrator {
    catalog: Arc<Catalog>,
    events: WorkerPool,
    rpc: WorkerPool,
    request_timeout: Duration,
    ids: Arc<CallIdAllocator>,
    stop: CancellationToken,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// In spawn order: event workers first, then RPC workers.
    pub reports: Vec<WorkerReport>,
    /// Workers whose task panicked instead of returning a report.
    pub lost_workers: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_sent(&self) -> u64 {
        self.reports.iter().map(|r| r.sent).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.reports.iter().map(|r| r.failed).sum()
    }

    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_sent() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        info!("=== Run summary ===");
        for report in &self.reports {
            info!(
                "  [{}] sent {:>8}  failed {:>8}",
                report.name, report.sent, report.failed
            );
        }
        info!(
            "Total: {} requests, {} failed, {:.2}s, {:.1} req/sec",
            self.total_sent(),
            self.total_failed(),
            self.elapsed.as_secs_f64(),
            self.throughput()
        );
        if self.lost_workers > 0 {
            error!("{} worker(s) terminated abnormally", self.lost_workers);
        }
    }
}

impl Orchestrator {
    pub fn new(catalog: Catalog, config: &Config) -> Self {
        Self {
            catalog: Arc::new(catalog),
            events: config.events.clone(),
            rpc: config.rpc.clone(),
            request_timeout: config.request_timeout,
            ids: Arc::new(CallIdAllocator::new()),
            stop: CancellationToken::new(),
        }
    }

    /// Cancelling this token (once or many times) stops every worker.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Spawn all workers, wait for `shutdown` (or an external cancel of the stop token),
    /// then wait for every worker to finish its current call and exit.
    pub async fn run<F>(self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut tasks = JoinSet::new();
        let mut seq = 0usize;

        // Build every client before spawning anything so a setup failure starts no traffic
        let mut event_workers = Vec::with_capacity(self.events.workers);
        for i in 1..=self.events.workers {
            event_workers.push(Worker::new(
                WorkerConfig::new(format!("E{i}"), self.events.rate, &self.events.base_url),
                EventWorkload::new(self.catalog.clone()),
                HttpTransport::new(self.request_timeout)?,
            ));
        }
        let mut rpc_workers = Vec::with_capacity(self.rpc.workers);
        for i in 1..=self.rpc.workers {
            rpc_workers.push(Worker::new(
                WorkerConfig::new(format!("R{i}"), self.rpc.rate, &self.rpc.base_url),
                RpcWorkload::new(self.ids.clone()),
                HttpTransport::new(self.request_timeout)?,
            ));
        }

        for worker in event_workers {
            spawn(&mut tasks, seq, worker, self.stop.clone());
            seq += 1;
        }
        for worker in rpc_workers {
            spawn(&mut tasks, seq, worker, self.stop.clone());
            seq += 1;
        }

        info!(
            "Started {} event worker(s) at {} rps and {} RPC worker(s) at {} rps",
            self.events.workers, self.events.rate, self.rpc.workers, self.rpc.rate
        );

        tokio::select! {
            _ = shutdown => info!("Stopping..."),
            _ = self.stop.cancelled() => info!("Stop requested"),
        }
        self.stop.cancel();

        let mut summary = RunSummary::default();
        let mut finished = Vec::with_capacity(seq);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => finished.push(done),
                Err(e) => {
                    error!("Worker task failed: {e}");
                    summary.lost_workers += 1;
                }
            }
        }
        finished.sort_by_key(|(seq, _)| *seq);
        summary.reports = finished.into_iter().map(|(_, report)| report).collect();
        summary.elapsed = started.elapsed();

        Ok(summary)
    }
}

fn spawn<W: Workload, T: Transport>(
    tasks: &mut JoinSet<(usize, WorkerReport)>,
    seq: usize,
    worker: Worker<W, T>,
    stop: CancellationToken,
) {
    tasks.spawn(async move { (seq, worker.run(stop).await) });
}
