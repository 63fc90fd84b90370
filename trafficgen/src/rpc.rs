use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

/// Every RPC call is posted to this path under the RPC base URL.
pub const RPC_PATH: &str = "/jsonrpc";

/// Query methods exposed by the aggregation service.
pub const RPC_METHODS: &[&str] = &[
    "GetPageViews",
    "GetClicks",
    "GetPerformance",
    "GetErrors",
    "GetCustomEvents",
];

pub const LIMITS: &[u64] = &[10, 50, 100];

/// Hands out JSON-RPC call identifiers, starting at 1.
#[derive(Debug, Default)]
pub struct CallIdAllocator {
    last: AtomicU64,
}

impl CallIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
    pub id: u64,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// User-scoped queries (page views, clicks) take an optional `user_id`; the rest only `limit`.
pub fn is_user_scoped(method: &str) -> bool {
    let lower = method.to_lowercase();
    lower.contains("page") || lower.contains("click")
}

pub fn build_params<R: Rng + ?Sized>(method: &str, rng: &mut R) -> Value {
    let limit = *LIMITS.choose(rng).unwrap_or(&LIMITS[0]);

    if is_user_scoped(method) {
        let user_id = rng
            .random_bool(0.5)
            .then(|| format!("user_{}", rng.random_range(1..=9999)));
        json!({ "user_id": user_id, "limit": limit })
    } else {
        json!({ "limit": limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let ids = CallIdAllocator::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ids_are_unique_without_gaps() {
        let ids = Arc::new(CallIdAllocator::new());
        let tasks = 16;
        let per_task = 500;

        let mut handles = Vec::new();
        for _ in 0..tasks {
            let ids = ids.clone();
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::with_capacity(per_task);
                for _ in 0..per_task {
                    seen.push(ids.next_id());
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(all.insert(id), "duplicate id {id}");
            }
        }

        let total = (tasks * per_task) as u64;
        assert_eq!(all.len() as u64, total);
        assert_eq!(all.iter().copied().min(), Some(1));
        assert_eq!(all.iter().copied().max(), Some(total));
    }

    #[test]
    fn test_click_queries_carry_user_id_and_limit() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut with_user = 0;
        let mut without_user = 0;

        for _ in 0..100 {
            let params = build_params("GetClicks", &mut rng);
            let fields = params.as_object().unwrap();

            assert_eq!(fields.len(), 2);
            assert!(LIMITS.contains(&fields["limit"].as_u64().unwrap()));
            match &fields["user_id"] {
                Value::Null => without_user += 1,
                Value::String(id) => {
                    assert!(id.starts_with("user_"));
                    with_user += 1;
                }
                other => panic!("unexpected user_id {other:?}"),
            }
        }
        assert!(with_user > 0 && without_user > 0);
    }

    #[test]
    fn test_global_queries_carry_only_limit() {
        let mut rng = StdRng::seed_from_u64(12);
        for method in ["GetErrors", "GetPerformance", "GetCustomEvents"] {
            for _ in 0..20 {
                let params = build_params(method, &mut rng);
                let fields = params.as_object().unwrap();
                assert_eq!(fields.len(), 1, "{method} params: {params}");
                assert!(fields.contains_key("limit"));
            }
        }
    }

    #[test]
    fn test_user_scoped_match_is_case_insensitive() {
        assert!(is_user_scoped("GetPageViews"));
        assert!(is_user_scoped("GETCLICKS"));
        assert!(!is_user_scoped("GetErrors"));
    }

    #[test]
    fn test_envelope_shape() {
        let request = RpcRequest::new("GetErrors", json!({"limit": 10}), 42);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "method": "GetErrors", "params": {"limit": 10}, "id": 42})
        );
    }
}
