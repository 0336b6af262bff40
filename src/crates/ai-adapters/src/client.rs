//! Anthropic Messages API client (streaming only)

use crate::provider::{TextStream, TextStreamProvider};
use crate::stream_handler::handle_anthropic_stream;
use crate::types::anthropic::MessagesRequest;
use crate::types::{ChatMessage, UnifiedResponse};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub anthropic_version: String,
    pub idle_timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("Anthropic API key is not configured"))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).context("Invalid API key header value")?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&self.config.anthropic_version)
                .context("Invalid anthropic-version header value")?,
        );
        Ok(headers)
    }

    /// Start a streamed completion and return the channel of parsed events.
    ///
    /// Returns `Err` when the request cannot be sent or the API answers with
    /// a non-success status; errors during the stream arrive on the channel.
    pub async fn stream_message(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<mpsc::UnboundedReceiver<Result<UnifiedResponse>>> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages,
            stream: true,
        };

        debug!(
            "Anthropic request: model={}, max_tokens={}, messages={}",
            self.config.model,
            self.config.max_tokens,
            messages.len()
        );

        let response = self
            .client
            .post(self.messages_url())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Anthropic")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Anthropic API error: status={}, body={}", status, text);
            return Err(anyhow!("Anthropic API error: status={}, body={}", status, text));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let idle_timeout = self.config.idle_timeout;
        tokio::spawn(async move {
            handle_anthropic_stream(response, tx, idle_timeout).await;
        });

        Ok(rx)
    }
}

#[async_trait]
impl TextStreamProvider for AnthropicClient {
    async fn stream_text(&self, system: &str, messages: &[ChatMessage]) -> Result<TextStream> {
        let rx = self.stream_message(system, messages).await?;
        let stream = UnboundedReceiverStream::new(rx).filter_map(|item| async move {
            match item {
                Ok(response) => {
                    if let Some(usage) = response.usage.as_ref() {
                        debug!(
                            "Anthropic usage: prompt_tokens={}, output_tokens={}, finish_reason={:?}",
                            usage.prompt_token_count,
                            usage.candidates_token_count,
                            response.finish_reason
                        );
                    }
                    response.text.filter(|text| !text.is_empty()).map(Ok)
                }
                Err(e) => Some(Err(e)),
            }
        });
        Ok(stream.boxed())
    }
}
