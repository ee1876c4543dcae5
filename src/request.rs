//! Protocol-specific request payloads.

use crate::providers::Protocol;
use serde::Serialize;

pub const OPENAI_TEMPERATURE: f64 = 0.7;
pub const ANTHROPIC_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system",
            content: content.to_string(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user",
            content: content.to_string(),
        }
    }
}

/// Body of an OpenAI chat completions call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionsRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

/// Body of an Anthropic messages call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRequest {
    OpenAi(ChatCompletionsRequest),
    Anthropic(MessagesRequest),
}

impl ProviderRequest {
    pub fn protocol(&self) -> Protocol {
        match self {
            ProviderRequest::OpenAi(_) => Protocol::OpenAiCompatible,
            ProviderRequest::Anthropic(_) => Protocol::AnthropicCompatible,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            ProviderRequest::OpenAi(body) => serde_json::to_value(body),
            ProviderRequest::Anthropic(body) => serde_json::to_value(body),
        }
    }
}

/// Builds the payload for one enhancement call.
pub fn shape(protocol: Protocol, system_instruction: &str, user_prompt: &str, model: &str) -> ProviderRequest {
    match protocol {
        Protocol::OpenAiCompatible => ProviderRequest::OpenAi(ChatCompletionsRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system_instruction), ChatMessage::user(user_prompt)],
            temperature: OPENAI_TEMPERATURE,
        }),
        Protocol::AnthropicCompatible => ProviderRequest::Anthropic(MessagesRequest {
            model: model.to_string(),
            max_tokens: ANTHROPIC_MAX_TOKENS,
            system: system_instruction.to_string(),
            messages: vec![ChatMessage::user(user_prompt)],
        }),
    }
}
