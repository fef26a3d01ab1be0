use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Deadline applied to every request unless the caller overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(12_000);

/// Transport failures, classified. Timeouts get their own variant so callers
/// can tell a slow backend from an unreachable one.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Network(anyhow::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.into())
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// GET `url` and return the parsed body.
    ///
    /// Query pairs with a `None` value are skipped. One deadline spans the
    /// whole exchange, headers and body read together; the timer is dropped
    /// on every exit path. A JSON content type yields the parsed document,
    /// anything else the raw body as a string value.
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, Option<&str>)],
        deadline: Duration,
    ) -> Result<Value, FetchError> {
        let pairs = present_pairs(query);
        timeout(deadline, self.exchange(url, &pairs))
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn exchange(&self, url: &str, pairs: &[(&str, &str)]) -> Result<Value, FetchError> {
        let response = self.client.get(url).query(pairs).send().await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        let text = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        if is_json {
            serde_json::from_str(&text)
                .map_err(|e| FetchError::Network(anyhow::anyhow!("invalid JSON body: {e}")))
        } else {
            Ok(Value::String(text))
        }
    }
}

fn present_pairs<'a>(query: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, &'a str)> {
    query
        .iter()
        .filter_map(|&(key, value)| value.map(|v| (key, v)))
        .collect()
}

/// Best-effort human-readable detail from an error body: a JSON `message`
/// or `error` field, else the raw text, else nothing.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error"] {
            if let Some(msg) = value.get(field).and_then(Value::as_str) {
                return Some(msg.to_string());
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
