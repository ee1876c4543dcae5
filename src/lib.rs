//! pmpt - AI-powered prompt enhancement library.
//!
//! This library provides the core functionality for turning a rough prompt
//! into a clearer one using an AI provider. It supports:
//!
//! - **OpenAI-compatible** chat completions (OpenAI, OpenRouter, custom endpoints)
//! - **Anthropic-compatible** messages
//! - **Enhancement styles** that control the instruction sent to the model
//! - **Language context** detected from the current project
//! - **Clipboard integration** for the enhanced result
//!
//! # Architecture
//!
//! The enhancement core:
//!
//! - [`providers`] - Resolves protocol, endpoint and extra headers from config
//! - [`request`] - Shapes protocol-specific request payloads
//! - [`dispatcher`] - Sends the request and translates failures
//! - [`http_client`] - HTTP client abstraction
//! - [`enhancer`] - Ties the core together behind `enhance`
//! - [`error`] - Typed configuration and enhancement errors
//!
//! Around it:
//!
//! - [`config`] - Configuration management (provider, API key, model, style)
//! - [`styles`] - The fixed style table
//! - [`language_detector`] - Project language detection
//! - [`clipboard`] - Clipboard copy through platform tools
//! - [`ui`] - Terminal dialogs
//! - [`session`] - The interactive loop
//!
//! # Example
//!
//! ```ignore
//! use pmpt::config::Config;
//! use pmpt::enhancer::Enhancer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let enhancer = Enhancer::with_default_transport(Arc::new(Config::load()?))?;
//!     let enhanced = enhancer.enhance("make a todo app", Some("Rust project")).await?;
//!     println!("{}", enhanced);
//!     Ok(())
//! }
//! ```

pub mod clipboard;
pub mod config;
pub mod dispatcher;
pub mod enhancer;
pub mod error;
pub mod http_client;
pub mod language_detector;
pub mod providers;
pub mod request;
pub mod session;
pub mod styles;
pub mod ui;
