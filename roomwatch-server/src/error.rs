//! Error types for the feed server.

use thiserror::Error;

/// Errors raised while configuring or running the feed server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
