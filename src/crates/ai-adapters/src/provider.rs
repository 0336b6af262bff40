use crate::types::ChatMessage;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Ordered stream of generated text fragments.
pub type TextStream = BoxStream<'static, Result<String>>;

/// A text-generation service that streams plain text deltas for a
/// system prompt plus a message list.
#[async_trait]
pub trait TextStreamProvider: Send + Sync {
    async fn stream_text(&self, system: &str, messages: &[ChatMessage]) -> Result<TextStream>;
}
