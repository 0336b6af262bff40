use super::unified::{UnifiedResponse, UnifiedTokenUsage};
use crate::types::chat::ChatMessage;
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/messages` with streaming enabled.
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct MessageStart {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    cache_read_input_tokens: Option<u32>,
    cache_creation_input_tokens: Option<u32>,
}

impl Usage {
    pub fn update(&mut self, other: &Usage) {
        if other.input_tokens.is_some() {
            self.input_tokens = other.input_tokens;
        }
        if other.output_tokens.is_some() {
            self.output_tokens = other.output_tokens;
        }
        if other.cache_read_input_tokens.is_some() {
            self.cache_read_input_tokens = other.cache_read_input_tokens;
        }
        if other.cache_creation_input_tokens.is_some() {
            self.cache_creation_input_tokens = other.cache_creation_input_tokens;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none()
            && self.output_tokens.is_none()
            && self.cache_read_input_tokens.is_none()
            && self.cache_creation_input_tokens.is_none()
    }
}

impl From<Usage> for UnifiedTokenUsage {
    fn from(value: Usage) -> Self {
        let cache_read = value.cache_read_input_tokens.unwrap_or(0);
        let cache_creation = value.cache_creation_input_tokens.unwrap_or(0);
        let prompt_token_count = value.input_tokens.unwrap_or(0) + cache_read + cache_creation;
        let candidates_token_count = value.output_tokens.unwrap_or(0);
        Self {
            prompt_token_count,
            candidates_token_count,
            total_token_count: prompt_token_count + candidates_token_count,
            cached_content_token_count: match (
                value.cache_read_input_tokens,
                value.cache_creation_input_tokens,
            ) {
                (None, None) => None,
                (read, creation) => Some(read.unwrap_or(0) + creation.unwrap_or(0)),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageDelta {
    pub delta: MessageDeltaDelta,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct MessageDeltaDelta {
    pub stop_reason: Option<String>,
}

impl From<MessageDelta> for UnifiedResponse {
    fn from(value: MessageDelta) -> Self {
        Self {
            text: None,
            usage: value.usage.map(UnifiedTokenUsage::from),
            finish_reason: value.delta.stop_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentBlockDelta {
    delta: Delta,
}

/// Only text deltas matter for a briefing; other block kinds are skipped.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Delta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(other)]
    Unknown,
}

impl TryFrom<ContentBlockDelta> for UnifiedResponse {
    type Error = String;
    fn try_from(value: ContentBlockDelta) -> Result<Self, Self::Error> {
        match value.delta {
            Delta::TextDelta { text } => Ok(UnifiedResponse {
                text: Some(text),
                ..Default::default()
            }),
            Delta::Unknown => Err("Non-text anthropic delta".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnthropicSSEError {
    pub error: AnthropicSSEErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicSSEErrorDetails {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl From<AnthropicSSEErrorDetails> for String {
    fn from(value: AnthropicSSEErrorDetails) -> Self {
        format!("{}: {}", value.error_type, value.message)
    }
}
