//! Provider resolution.
//!
//! Decides, from a configuration snapshot, which wire protocol to speak and
//! which endpoint to call. No network access happens here.

use crate::config::{Config, Provider};
use crate::error::{ConfigurationError, Result, UnsupportedProtocolError};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const ANTHROPIC_HOST: &str = "anthropic.com";
const OPENROUTER_HOST: &str = "openrouter.ai";

/// Headers OpenRouter uses to attribute traffic to the calling application.
pub const OPENROUTER_HEADERS: [(&str, &str); 2] =
    [("HTTP-Referer", "pmpt-cli"), ("X-Title", "PMPT CLI")];

/// Wire formats the dispatcher can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// OpenAI chat completions. Covers OpenAI, OpenRouter and custom endpoints.
    OpenAiCompatible,
    /// Anthropic messages.
    AnthropicCompatible,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::OpenAiCompatible => f.write_str("OpenAI-compatible"),
            Protocol::AnthropicCompatible => f.write_str("Anthropic-compatible"),
        }
    }
}

impl FromStr for Protocol {
    type Err = UnsupportedProtocolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compatible" => Ok(Protocol::OpenAiCompatible),
            "anthropic" | "anthropic-compatible" => Ok(Protocol::AnthropicCompatible),
            _ => Err(UnsupportedProtocolError(s.to_string())),
        }
    }
}

/// Result of resolving a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub protocol: Protocol,
    /// Base URL without a trailing slash.
    pub endpoint: String,
    pub extra_headers: Vec<(String, String)>,
}

/// Resolves protocol, endpoint and extra headers from `config`.
///
/// # Errors
///
/// - [`ConfigurationError::NoEndpoint`] if neither a provider nor a base URL is set
/// - [`UnsupportedProtocolError`] if an explicit protocol override is unknown
pub fn resolve(config: &Config) -> Result<ResolvedEndpoint> {
    let endpoint = config
        .get_base_url()
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .ok_or(ConfigurationError::NoEndpoint)?;

    let protocol = match config.protocol.as_deref() {
        Some(explicit) => explicit.parse::<Protocol>()?,
        None => detect_protocol(config.provider, &endpoint),
    };

    let extra_headers = if is_openrouter(&endpoint) {
        OPENROUTER_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        Vec::new()
    };

    debug!("Resolved {} endpoint {}", protocol, endpoint);

    Ok(ResolvedEndpoint {
        protocol,
        endpoint,
        extra_headers,
    })
}

fn detect_protocol(provider: Option<Provider>, endpoint: &str) -> Protocol {
    if provider == Some(Provider::Anthropic) || host_of(endpoint).contains(ANTHROPIC_HOST) {
        Protocol::AnthropicCompatible
    } else {
        Protocol::OpenAiCompatible
    }
}

fn is_openrouter(endpoint: &str) -> bool {
    host_of(endpoint).contains(OPENROUTER_HOST)
}

/// Host part of a URL, or the whole string when it has no scheme.
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}
