//! HTTP client abstraction for provider communication.
//!
//! This module provides a trait-based abstraction over HTTP clients, enabling
//! dependency injection and easy mocking in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The status line arrived but the body could not be read.
///
/// Returned inside the `anyhow` error of [`HttpClient::post_json`] so callers
/// can tell a broken response from a request that never got one.
#[derive(Debug, thiserror::Error)]
#[error("HTTP {status}: failed to read response body: {message}")]
pub struct BodyReadError {
    pub status: u16,
    pub message: String,
}

/// Trait for HTTP communication with provider APIs.
///
/// This abstraction allows injecting mock HTTP clients for testing without
/// making real network requests.
///
/// # Example
///
/// ```ignore
/// use pmpt::http_client::{HttpClient, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new(std::time::Duration::from_secs(30))?;
/// let response = client.post_json(
///     "https://api.example.com/endpoint",
///     &[("Content-Type".to_string(), "application/json".to_string())],
///     &serde_json::json!({"key": "value"}),
/// ).await?;
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with JSON body and returns status and body.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained (connection failure,
    /// timeout), or a [`BodyReadError`] if the body cannot be read.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse>;
}

/// HTTP client implementation using reqwest.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| BodyReadError {
            status,
            message: e.to_string(),
        })?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let ok = HttpResponse { status: 200, body: String::new() };
        let created = HttpResponse { status: 201, body: String::new() };
        let unauthorized = HttpResponse { status: 401, body: String::new() };
        assert!(ok.is_success());
        assert!(created.is_success());
        assert!(!unauthorized.is_success());
    }

    #[test]
    fn test_body_read_error_is_recoverable_from_anyhow() {
        let err: anyhow::Error = BodyReadError { status: 200, message: "connection reset".to_string() }.into();

        let body_error = err.downcast_ref::<BodyReadError>().unwrap();
        assert_eq!(body_error.status, 200);
        assert_eq!(err.to_string(), "HTTP 200: failed to read response body: connection reset");
    }

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(ReqwestHttpClient::new(Duration::from_secs(5)).is_ok());
    }
}
