//! OneThing AI adapters
//!
//! Wire types and stream handling for the text-generation service used by the
//! morning briefing.

pub mod client;
pub mod provider;
pub mod stream_handler;
pub mod types;

pub use client::{AnthropicClient, AnthropicConfig};
pub use provider::{TextStream, TextStreamProvider};
pub use types::{ChatMessage, ChatRole, UnifiedResponse, UnifiedTokenUsage};
