//! Common error types for Jigsaw components.

use thiserror::Error;

/// Errors surfaced by challenge generation, lookup, and verification
#[derive(Debug, Error)]
pub enum ChallengeError {
    /// Source image (or generated background) cannot be used for the configured canvas
    #[error("Invalid source image: {0}")]
    InvalidSourceImage(String),

    /// Unknown (or expired) challenge token
    #[error("No such challenge: {0}")]
    NotFound(String),

    /// Malformed or missing verification input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Image encode/decode failure
    #[error("Codec error: {0}")]
    Codec(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChallengeError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSourceImage(_) => 500,
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::Codec(_) => 500,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Machine-readable error tag sent to clients
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSourceImage(_) => "invalid-source-image",
            Self::NotFound(_) => "not-found",
            Self::BadRequest(_) => "bad-request",
            Self::Codec(_) => "codec",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns true if the caller caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::BadRequest(_))
    }
}
