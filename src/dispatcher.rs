//! Transport dispatch and error translation.
//!
//! [`Dispatcher`] sends one shaped request to a resolved endpoint and pulls
//! the completion text out of the protocol-specific response. Every failure
//! along the way is translated into an [`EnhancementError`], so callers never
//! see transport or parsing error types.

use crate::error::EnhancementError;
use crate::http_client::{BodyReadError, HttpClient, HttpResponse};
use crate::providers::{Protocol, ResolvedEndpoint};
use crate::request::ProviderRequest;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Longest slice of a raw error body kept in an error cause.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Executes provider requests over an injected [`HttpClient`].
#[derive(Clone)]
pub struct Dispatcher {
    http: Arc<dyn HttpClient>,
}

impl Dispatcher {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Sends `request` to `resolved` and returns the trimmed completion text.
    ///
    /// Issues exactly one HTTP call and never retries.
    ///
    /// # Errors
    ///
    /// Returns [`EnhancementError`] with [`crate::error::Phase::Request`] when no
    /// response was received, and [`crate::error::Phase::Response`] for error
    /// statuses, malformed bodies and empty completions.
    pub async fn dispatch(
        &self,
        resolved: &ResolvedEndpoint,
        credential: &str,
        request: &ProviderRequest,
    ) -> Result<String, EnhancementError> {
        let protocol = resolved.protocol;
        if request.protocol() != protocol {
            return Err(EnhancementError::request(
                protocol,
                format!("request shaped for {} cannot be sent to a {} endpoint", request.protocol(), protocol),
            ));
        }

        let url = request_url(protocol, &resolved.endpoint);
        let mut headers = auth_headers(protocol, credential);
        headers.extend(resolved.extra_headers.iter().cloned());

        let body = request
            .to_json()
            .map_err(|e| EnhancementError::request(protocol, format!("failed to encode request: {}", e)))?;

        debug!("Dispatching {} request to {}", protocol, url);

        let response = self
            .http
            .post_json(&url, &headers, &body)
            .await
            .map_err(|e| {
                if e.downcast_ref::<BodyReadError>().is_some() {
                    EnhancementError::response(protocol, format!("{:#}", e))
                } else {
                    EnhancementError::request(protocol, format!("{:#}", e))
                }
            })?;

        debug!("{} responded with status {}", url, response.status);

        extract_completion(protocol, &response)
    }
}

fn request_url(protocol: Protocol, endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    match protocol {
        Protocol::OpenAiCompatible => format!("{}/chat/completions", endpoint),
        Protocol::AnthropicCompatible => format!("{}/messages", endpoint),
    }
}

fn auth_headers(protocol: Protocol, credential: &str) -> Vec<(String, String)> {
    let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
    match protocol {
        Protocol::OpenAiCompatible => {
            headers.push(("authorization".to_string(), format!("Bearer {}", credential)));
        }
        Protocol::AnthropicCompatible => {
            headers.push(("x-api-key".to_string(), credential.to_string()));
            headers.push(("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()));
        }
    }
    headers
}

/// Pulls the completion text out of a provider response.
fn extract_completion(protocol: Protocol, response: &HttpResponse) -> Result<String, EnhancementError> {
    if !response.is_success() {
        return Err(EnhancementError::response(
            protocol,
            format!("HTTP {}: {}", response.status, error_message(&response.body)),
        ));
    }

    let malformed = |e: serde_json::Error| EnhancementError::response(protocol, format!("malformed response: {}", e));

    let text = match protocol {
        Protocol::OpenAiCompatible => {
            let parsed: ChatCompletionsResponse = serde_json::from_str(&response.body).map_err(malformed)?;
            parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| EnhancementError::response(protocol, "response contained no choices"))?
                .message
                .content
        }
        Protocol::AnthropicCompatible => {
            let parsed: MessagesResponse = serde_json::from_str(&response.body).map_err(malformed)?;
            if parsed.content.is_empty() {
                return Err(EnhancementError::response(protocol, "response contained no content blocks"));
            }
            // Blocks without text (thinking, tool_use) are skipped.
            parsed.content.into_iter().find_map(|block| block.text)
        }
    };

    let text = text.map(|t| t.trim().to_string()).unwrap_or_default();
    if text.is_empty() {
        return Err(EnhancementError::response(protocol, "provider returned an empty completion"));
    }
    Ok(text)
}

/// Provider error message from an error body, falling back to the raw body.
///
/// OpenAI and Anthropic both use `{"error": {"message": ...}}`.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        let error = v.get("error")?;
        error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}
