pub mod anthropic;
pub mod chat;
pub mod unified;

pub use chat::{ChatMessage, ChatRole};
pub use unified::{UnifiedResponse, UnifiedTokenUsage};
