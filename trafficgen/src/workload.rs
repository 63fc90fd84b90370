use crate::catalog::Catalog;
use crate::ports::{PlannedRequest, RequestKind, Workload};
use crate::randomizer::randomize_with;
use crate::rpc::{self, CallIdAllocator, RPC_METHODS, RPC_PATH, RpcRequest};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde_json::json;
use std::sync::Arc;

/// Replays randomized catalog examples against their own paths.
#[derive(Clone)]
pub struct EventWorkload {
    catalog: Arc<Catalog>,
}

impl EventWorkload {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Workload for EventWorkload {
    fn mode(&self) -> &'static str {
        "event"
    }

    fn next_request(&self, rng: &mut StdRng) -> PlannedRequest {
        let example = self.catalog.choose(rng);
        PlannedRequest {
            path: example.path.clone(),
            body: randomize_with(&example.template, rng),
            kind: RequestKind::Event,
        }
    }
}

/// Issues JSON-RPC aggregation queries; ids come from an allocator shared by all RPC workers.
#[derive(Clone)]
pub struct RpcWorkload {
    ids: Arc<CallIdAllocator>,
}

impl RpcWorkload {
    pub fn new(ids: Arc<CallIdAllocator>) -> Self {
        Self { ids }
    }
}

impl Workload for RpcWorkload {
    fn mode(&self) -> &'static str {
        "rpc"
    }

    fn next_request(&self, rng: &mut StdRng) -> PlannedRequest {
        let method = *RPC_METHODS.choose(rng).unwrap_or(&RPC_METHODS[0]);
        let params = rpc::build_params(method, rng);
        let id = self.ids.next_id();

        PlannedRequest {
            path: RPC_PATH.to_string(),
            body: json!(RpcRequest::new(method, params, id)),
            kind: RequestKind::Rpc {
                method: method.to_string(),
                id,
            },
        }
    }
}
