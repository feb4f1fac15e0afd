//! HTTP transport (C1).
//!
//! `fetch(url, ...) -> (bytes, status) | Error` plus JSON/text
//! convenience wrappers, all going through one retry policy: up to 3
//! attempts, linear backoff `1s * attempt`. Retried: 5xx, 429, and
//! transport-level errors (timeout, reset, DNS). Surfaced immediately:
//! any 4xx other than 429, and parse errors.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Transport { client })
    }

    /// GET `url` and decode the body as JSON, retrying per the policy
    /// above.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T> {
        self.get_json_with_headers(url, HeaderMap::new(), timeout).await
    }

    pub async fn get_json_with_headers<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<T> {
        let bytes = self.get_with_retry(url, headers, timeout).await?;
        serde_json::from_slice(&bytes).map_err(PipelineError::from)
    }

    /// GET `url` and return the raw response body as text (used by
    /// adapters consuming XML).
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String> {
        self.get_text_with_headers(url, HeaderMap::new(), timeout).await
    }

    pub async fn get_text_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<String> {
        let bytes = self.get_with_retry(url, headers, timeout).await?;
        String::from_utf8(bytes)
            .map_err(|e| PipelineError::Parse(format!("invalid utf-8 response body: {e}")))
    }

    async fn get_with_retry(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let mut attempt = 1u32;
        loop {
            debug!(url, attempt, "transport: issuing GET");
            let result = self
                .client
                .get(url)
                .headers(headers.clone())
                .timeout(timeout)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .bytes()
                            .await
                            .map(|b| b.to_vec())
                            .map_err(PipelineError::from);
                    }
                    if is_retryable_status(status) && attempt < MAX_ATTEMPTS {
                        warn!(url, %status, attempt, "transport: retryable status, backing off");
                        tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                        attempt += 1;
                        continue;
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(PipelineError::Upstream {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => {
                    let retryable = e.is_timeout() || e.is_connect() || e.is_request();
                    if retryable && attempt < MAX_ATTEMPTS {
                        warn!(url, attempt, error = %e, "transport: transient error, backing off");
                        tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(PipelineError::from(e));
                }
            }
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Build a single-header `HeaderMap`, used by adapters that need an API
/// key header (e.g. Semantic Scholar's `x-api-key`).
pub fn single_header(name: &'static str, value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(value) {
        map.insert(name, value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_are_5xx_and_429() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn single_header_builds_expected_map() {
        let headers = single_header("x-api-key", "secret");
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
    }
}
