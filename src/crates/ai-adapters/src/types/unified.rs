use serde::{Deserialize, Serialize};

/// Provider-neutral token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedTokenUsage {
    pub prompt_token_count: u32,
    pub candidates_token_count: u32,
    pub total_token_count: u32,
    pub cached_content_token_count: Option<u32>,
}

/// One parsed increment of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedResponse {
    pub text: Option<String>,
    pub usage: Option<UnifiedTokenUsage>,
    pub finish_reason: Option<String>,
}
