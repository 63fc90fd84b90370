//! Smoke checks against a running event-ingestion service.
//!
//! A fixed, ordered list of requests with the status code (and for rejected payloads, the
//! error `code`) each one must produce.

use crate::transport::join_url;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use shared::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum CheckBody {
    None,
    Json(Value),
    /// Sent as-is with a JSON content type.
    Raw(&'static str),
}

#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub body: CheckBody,
    pub expected_status: u16,
    /// Required `(field, value)` in the JSON response body.
    pub expected_field: Option<(&'static str, &'static str)>,
}

impl Check {
    fn post(name: &'static str, path: &'static str, body: Value, expected_status: u16) -> Self {
        Self {
            name,
            method: Method::POST,
            path,
            body: CheckBody::Json(body),
            expected_status,
            expected_field: None,
        }
    }

    fn rejects(mut self, code: &'static str) -> Self {
        self.expected_field = Some(("code", code));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: &'static str,
    /// `None` when the check passed, otherwise what went wrong.
    pub failure: Option<String>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub results: Vec<CheckResult>,
}

impl VerifyReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// The standard check sequence, timestamps taken from `now` (unix seconds).
pub fn standard_checks(now: i64) -> Vec<Check> {
    vec![
        Check {
            name: "health ping",
            method: Method::GET,
            path: "/health/ping",
            body: CheckBody::None,
            expected_status: 200,
            expected_field: Some(("status", "ok")),
        },
        Check::post(
            "page view",
            "/page-views",
            json!({
                "page": "/home",
                "user_id": "user_123",
                "session_id": "sess_456",
                "referrer": "https://google.com",
                "timestamp": now
            }),
            202,
        ),
        Check::post(
            "page view with empty page",
            "/page-views",
            json!({"page": "", "timestamp": now}),
            400,
        )
        .rejects("INVALID_PAGE_VIEW"),
        Check::post(
            "click",
            "/clicks",
            json!({
                "page": "/pricing",
                "element_id": "cta-button",
                "action": "click",
                "timestamp": now
            }),
            202,
        ),
        Check::post(
            "click with empty element_id",
            "/clicks",
            json!({"page": "/pricing", "element_id": "", "timestamp": now}),
            400,
        )
        .rejects("INVALID_CLICK_EVENT"),
        Check::post(
            "performance",
            "/performance",
            json!({
                "page": "/dashboard",
                "ttfb_ms": 120,
                "fcp_ms": 450,
                "lcp_ms": 800,
                "total_page_load_ms": 1100,
                "timestamp": now
            }),
            202,
        ),
        Check::post(
            "performance with negative timing",
            "/performance",
            json!({"page": "/dashboard", "ttfb_ms": -10, "timestamp": now}),
            400,
        )
        .rejects("INVALID_PERFORMANCE_EVENT"),
        Check::post(
            "error event",
            "/errors",
            json!({
                "page": "/dashboard",
                "error_type": "js_exception",
                "message": "Cannot read property 'id' of undefined",
                "stack": "TypeError: ...\n    at Dashboard.tsx:42",
                "severity": "error",
                "timestamp": now
            }),
            202,
        ),
        Check::post(
            "error event with empty message",
            "/errors",
            json!({
                "page": "/dashboard",
                "error_type": "js_exception",
                "message": "",
                "timestamp": now
            }),
            400,
        )
        .rejects("INVALID_ERROR_EVENT"),
        Check::post(
            "custom event",
            "/custom-events",
            json!({
                "name": "signup_completed",
                "page": "/signup/success",
                "user_id": "user_123",
                "properties": {"plan": "pro", "source": "landing_a"},
                "timestamp": now
            }),
            202,
        ),
        Check::post(
            "custom event with empty name",
            "/custom-events",
            json!({"name": "", "timestamp": now}),
            400,
        )
        .rejects("INVALID_CUSTOM_EVENT"),
        Check {
            name: "invalid json",
            method: Method::POST,
            path: "/page-views",
            body: CheckBody::Raw("not valid json"),
            expected_status: 400,
            expected_field: None,
        },
    ]
}

pub struct Verifier {
    client: Client,
    base_url: String,
}

impl Verifier {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Run `checks` in order. Every check runs even after a failure.
    pub async fn run(&self, checks: &[Check]) -> VerifyReport {
        info!("Testing API at {}", self.base_url);

        let mut report = VerifyReport::default();
        for check in checks {
            let failure = self.run_check(check).await.err();
            match &failure {
                None => info!("{} {} ({}): PASSED", check.method, check.path, check.name),
                Some(reason) => warn!(
                    "{} {} ({}): FAILED: {}",
                    check.method, check.path, check.name, reason
                ),
            }
            report.results.push(CheckResult {
                name: check.name,
                failure,
            });
        }

        info!(
            "Results: {} passed, {} failed",
            report.passed(),
            report.failed()
        );
        report
    }

    async fn run_check(&self, check: &Check) -> std::result::Result<(), String> {
        let url = join_url(&self.base_url, check.path);
        let request = self.client.request(check.method.clone(), &url);
        let request = match &check.body {
            CheckBody::None => request,
            CheckBody::Json(body) => request.json(body),
            CheckBody::Raw(raw) => request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(*raw),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                format!("could not connect to {}", self.base_url)
            } else {
                e.to_string()
            }
        })?;

        let status = response.status().as_u16();
        if status != check.expected_status {
            return Err(format!("expected {}, got {}", check.expected_status, status));
        }

        if let Some((field, expected)) = check.expected_field {
            let body: Value = response
                .json()
                .await
                .map_err(|e| format!("response body is not JSON: {e}"))?;
            match body.get(field).and_then(Value::as_str) {
                Some(actual) if actual == expected => {}
                other => {
                    return Err(format!("expected {field} {expected:?}, got {other:?}"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn reject(server: &MockServer, route: &str, body: Value, code: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .and(body_partial_json(body))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"code": code})))
            .with_priority(1)
            .mount(server)
            .await;
    }

    async fn accept_all_posts(server: &MockServer) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(server)
            .await;
    }

    /// Behaves like a correct ingestion service.
    async fn well_behaved_service() -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string("not valid json"))
            .respond_with(ResponseTemplate::new(400))
            .with_priority(1)
            .mount(&server)
            .await;

        reject(&server, "/page-views", json!({"page": ""}), "INVALID_PAGE_VIEW").await;
        reject(&server, "/clicks", json!({"element_id": ""}), "INVALID_CLICK_EVENT").await;
        reject(&server, "/performance", json!({"ttfb_ms": -10}), "INVALID_PERFORMANCE_EVENT").await;
        reject(&server, "/errors", json!({"message": ""}), "INVALID_ERROR_EVENT").await;
        reject(&server, "/custom-events", json!({"name": ""}), "INVALID_CUSTOM_EVENT").await;
        accept_all_posts(&server).await;

        server
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_standard_checks_cover_every_endpoint() {
        let checks = standard_checks(1000);
        assert_eq!(checks.len(), 12);

        let paths: std::collections::BTreeSet<&str> = checks.iter().map(|c| c.path).collect();
        for expected in [
            "/health/ping",
            "/page-views",
            "/clicks",
            "/performance",
            "/errors",
            "/custom-events",
        ] {
            assert!(paths.contains(expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_all_checks_pass_against_correct_service() {
        let server = well_behaved_service().await;
        let verifier = Verifier::new(server.uri(), Duration::from_secs(5)).unwrap();

        let report = verifier.run(&standard_checks(now())).await;

        let failures: Vec<_> = report.results.iter().filter(|r| !r.passed()).collect();
        assert!(failures.is_empty(), "unexpected failures: {failures:?}");
        assert!(report.is_success());
        assert_eq!(report.passed(), 12);
    }

    #[tokio::test]
    async fn test_lenient_service_fails_rejection_checks() {
        let server = MockServer::start().await;
        accept_all_posts(&server).await;
        let verifier = Verifier::new(server.uri(), Duration::from_secs(5)).unwrap();

        let report = verifier.run(&standard_checks(now())).await;

        // Only the five valid payloads succeed; health ping 404s and every rejection is missed
        assert_eq!(report.passed(), 5);
        assert_eq!(report.failed(), 7);
        assert!(!report.is_success());

        let health = &report.results[0];
        assert_eq!(health.name, "health ping");
        assert_eq!(health.failure.as_deref(), Some("expected 200, got 404"));
    }

    #[tokio::test]
    async fn test_wrong_error_code_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"code": "SOMETHING_ELSE"})))
            .mount(&server)
            .await;
        let verifier = Verifier::new(server.uri(), Duration::from_secs(5)).unwrap();

        let check = Check::post("click with empty element_id", "/clicks", json!({}), 400)
            .rejects("INVALID_CLICK_EVENT");
        let report = verifier.run(&[check]).await;

        assert_eq!(report.failed(), 1);
        assert!(report.results[0].failure.as_ref().unwrap().contains("INVALID_CLICK_EVENT"));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_every_check() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let verifier =
            Verifier::new(format!("http://127.0.0.1:{port}"), Duration::from_secs(1)).unwrap();

        let report = verifier.run(&standard_checks(now())).await;

        assert_eq!(report.failed(), 12);
        assert!(
            report
                .results
                .iter()
                .all(|r| r.failure.as_deref().is_some_and(|f| f.contains("could not connect")))
        );
    }
}
