//! Error types for the RESO client.

use thiserror::Error;

/// Result type for RESO client operations.
pub type Result<T> = std::result::Result<T, ResoError>;

/// RESO client errors.
///
/// Rate limiting (HTTP 429) is deliberately absent: it is reported through
/// [`crate::ListingPage::rate_limited`] and [`crate::PhotoFetch::RateLimited`].
#[derive(Debug, Error)]
pub enum ResoError {
    /// Transport failure or undecodable response body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response other than 429
    #[error("MLS API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid client settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scan stopped by its cancellation token
    #[error("operation cancelled")]
    Cancelled,
}
