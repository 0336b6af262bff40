//! Error types shared across the OneThing crates

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OneThingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type OneThingResult<T> = Result<T, OneThingError>;

impl From<reqwest::Error> for OneThingError {
    fn from(error: reqwest::Error) -> Self {
        OneThingError::Transport(error.to_string())
    }
}

impl From<toml::de::Error> for OneThingError {
    fn from(error: toml::de::Error) -> Self {
        OneThingError::Config(error.to_string())
    }
}
