use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::TraceQuery;
use crate::config::{RequestConfig, TraceApiConfig};
use crate::error::{TraceApiError, TraceApiResult};

/// Client for the skip-trace provider API
#[derive(Clone)]
pub struct TraceClient {
    client: Client,
    base_url: String,
    api_key: String,
    host: String,
    request_config: RequestConfig,
}

impl TraceClient {
    /// Create a new trace client
    pub fn new(config: &TraceApiConfig, request_config: RequestConfig) -> TraceApiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(TraceApiError::MissingCredentials);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(TraceApiError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            host: config.host.clone(),
            request_config,
        })
    }

    /// Run a lookup and return the raw payload
    pub async fn lookup(&self, query: &TraceQuery) -> TraceApiResult<Value> {
        let url = format!("{}{}", self.base_url, query.endpoint());
        let api_name = query.api_name();

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    api = %api_name,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying trace request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, query).await {
                Ok(response) => {
                    info!(
                        api = %api_name,
                        latency_ms = start.elapsed().as_millis(),
                        "Trace lookup succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        api = %api_name,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Trace lookup failed"
                    );
                    if !is_retryable(&e) {
                        return Err(e);
                    }
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(TraceApiError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(&self, url: &str, query: &TraceQuery) -> TraceApiResult<Value> {
        debug!(endpoint = %query.endpoint(), "Calling trace API");

        let response = self
            .client
            .get(url)
            .header("x-rapidapi-key", self.api_key.as_str())
            .header("x-rapidapi-host", self.host.as_str())
            .query(&query.params())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TraceApiError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    TraceApiError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(TraceApiError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TraceApiError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Client errors other than timeouts and rate limits will not improve on retry.
fn is_retryable(error: &TraceApiError) -> bool {
    match error {
        TraceApiError::Api { status, .. } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            !status.is_client_error()
                || status == StatusCode::TOO_MANY_REQUESTS
                || status == StatusCode::REQUEST_TIMEOUT
        }
        TraceApiError::MissingCredentials | TraceApiError::InvalidResponse { .. } => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_key: &str) -> TraceApiConfig {
        TraceApiConfig {
            api_key: api_key.to_string(),
            base_url: "https://trace.example.com/".to_string(),
            host: "trace.example.com".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = TraceClient::new(&test_config("key"), RequestConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://trace.example.com");
    }

    #[test]
    fn test_client_requires_key() {
        let result = TraceClient::new(&test_config("  "), RequestConfig::default());
        assert!(matches!(result, Err(TraceApiError::MissingCredentials)));
    }

    #[test]
    fn test_retryable_statuses() {
        let api = |status| TraceApiError::Api {
            status,
            message: String::new(),
        };
        assert!(is_retryable(&api(500)));
        assert!(is_retryable(&api(429)));
        assert!(!is_retryable(&api(401)));
        assert!(!is_retryable(&api(404)));
        assert!(is_retryable(&TraceApiError::Timeout { timeout_ms: 1 }));
    }
}
