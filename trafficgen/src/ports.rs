use async_trait::async_trait;
use rand::rngs::StdRng;
use serde_json::Value;

// Ports are the pluggable seams between the rate-limited loop and what it sends

/// What a single request is for, used for log attribution.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Event,
    Rpc { method: String, id: u64 },
}

/// A fully-built request, ready to be posted under a worker's base URL.
#[derive(Debug, Clone)]
pub struct PlannedRequest {
    pub path: String,
    pub body: Value,
    pub kind: RequestKind,
}

impl PlannedRequest {
    /// RPC responses are worth a glance; event responses are not read at all.
    pub fn wants_body_preview(&self) -> bool {
        matches!(self.kind, RequestKind::Rpc { .. })
    }
}

/// How a single call ended. Any status code counts as a response.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Response {
        status: u16,
        reason: String,
        preview: Option<String>,
    },
    Failed(String),
}

impl RequestOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RequestOutcome::Failed(_))
    }
}

/// Port producing the next request for a worker
pub trait Workload: Send + Sync + 'static {
    /// Short label for logs, e.g. "event" or "rpc".
    fn mode(&self) -> &'static str;
    fn next_request(&self, rng: &mut StdRng) -> PlannedRequest;
}

/// Port for delivering a request (e.g., reqwest over HTTP)
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn post(&self, url: &str, body: &Value, read_body: bool) -> RequestOutcome;
}
