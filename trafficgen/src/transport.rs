use crate::ports::{RequestOutcome, Transport};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{Error, Result};
use std::time::Duration;

/// Upper bound on how much of a response body ends up in a log line.
pub const PREVIEW_CHARS: usize = 200;

/// reqwest-backed transport. Each worker owns one so connections are reused per worker.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: &Value, read_body: bool) -> RequestOutcome {
        let response = match self.client.post(url).json(body).send().await {
            Ok(response) => response,
            Err(e) => return RequestOutcome::Failed(e.to_string()),
        };

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();

        let preview = if read_body {
            Some(match response.text().await {
                Ok(text) => preview(&text, PREVIEW_CHARS),
                Err(e) => format!("<unreadable body: {e}>"),
            })
        } else {
            None
        };

        RequestOutcome::Response {
            status: status.as_u16(),
            reason,
            preview,
        }
    }
}

/// First `max_chars` characters of `text`, marked when cut short.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `base` and `path` joined with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
