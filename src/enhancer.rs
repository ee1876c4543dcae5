//! Prompt enhancement entry point.
//!
//! [`Enhancer`] ties the core together: it reads a configuration snapshot,
//! resolves the provider, shapes the request and dispatches it.

use crate::config::{Config, ConfigSource};
use crate::dispatcher::Dispatcher;
use crate::error::{ConfigurationError, Result};
use crate::http_client::ReqwestHttpClient;
use crate::providers::resolve;
use crate::request::shape;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Enhances prompts using the configured provider.
///
/// Holds no per-call state, so one instance can serve concurrent calls.
///
/// # Example
///
/// ```ignore
/// use pmpt::config::Config;
/// use pmpt::enhancer::Enhancer;
///
/// let enhancer = Enhancer::with_default_transport(Arc::new(Config::load()?))?;
/// let enhanced = enhancer.enhance("write tests for my parser", Some("Rust project")).await?;
/// ```
pub struct Enhancer {
    config: Arc<dyn ConfigSource>,
    dispatcher: Dispatcher,
}

impl Enhancer {
    pub fn new(config: Arc<dyn ConfigSource>, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    /// Creates an enhancer backed by reqwest, with the timeout taken from the
    /// current configuration.
    pub fn with_default_transport(config: Arc<dyn ConfigSource>) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.snapshot().timeout_secs());
        let http = ReqwestHttpClient::new(timeout)?;
        Ok(Self::new(config, Dispatcher::new(Arc::new(http))))
    }

    /// Enhances `user_prompt` with the active style's instruction.
    ///
    /// `language_context` is appended to the instruction verbatim when present.
    pub async fn enhance(&self, user_prompt: &str, language_context: Option<&str>) -> Result<String> {
        let config = self.config.snapshot();
        let instruction = config.current_style.system_instruction(language_context);
        self.enhance_with_config(&config, &instruction, user_prompt).await
    }

    /// Enhances `user_prompt` with an explicit system instruction.
    ///
    /// # Errors
    ///
    /// Configuration problems are reported before any network attempt;
    /// everything after that is an [`crate::error::EnhancementError`].
    pub async fn enhance_with_instruction(&self, system_instruction: &str, user_prompt: &str) -> Result<String> {
        let config = self.config.snapshot();
        self.enhance_with_config(&config, system_instruction, user_prompt).await
    }

    async fn enhance_with_config(&self, config: &Config, system_instruction: &str, user_prompt: &str) -> Result<String> {
        let resolved = resolve(config)?;

        let api_key = non_empty(config.api_key.as_deref()).ok_or(ConfigurationError::MissingApiKey)?;
        let model = non_empty(config.model.as_deref()).ok_or(ConfigurationError::MissingModel)?;

        let request = shape(resolved.protocol, system_instruction, user_prompt, model);
        debug!("Enhancing prompt with model {} via {}", model, resolved.protocol);

        Ok(self.dispatcher.dispatch(&resolved, api_key, &request).await?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
