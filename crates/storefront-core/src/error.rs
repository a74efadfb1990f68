//! Error Types

use thiserror::Error;

/// Result type alias for storefront operations
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Storefront error taxonomy
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Malformed or empty request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Durable storage could not be read or written
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// The payment processor (or the endpoint fronting it) reported a failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The request could not be sent or the response could not be received
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorefrontError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorefrontError::Upstream(_)
                | StorefrontError::Network(_)
                | StorefrontError::PersistenceUnavailable(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            StorefrontError::InvalidInput(msg) => format!("Invalid request: {msg}"),
            StorefrontError::Upstream(msg) if !msg.is_empty() => msg.clone(),
            StorefrontError::Upstream(_) => "Failed to initialize payment. Please try again.".into(),
            StorefrontError::Network(_) => "Network error. Please check your connection.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<reqwest::Error> for StorefrontError {
    fn from(err: reqwest::Error) -> Self {
        StorefrontError::Network(err.to_string())
    }
}
