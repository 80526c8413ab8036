//! Error types for the DeepL client.

use thiserror::Error;

/// Result type for DeepL client operations.
pub type Result<T> = std::result::Result<T, DeepLError>;

/// DeepL client errors.
#[derive(Debug, Error)]
pub enum DeepLError {
    /// Missing API key or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response (quota exceeded, bad key, invalid request)
    #[error("DeepL API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
}
