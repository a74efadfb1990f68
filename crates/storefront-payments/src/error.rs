//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Malformed, empty or unpriceable request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Payment processor rejected or failed the call
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::Stripe(_) | PaymentError::Storage(_))
    }

    /// Message safe to return to the client. Processor messages are passed
    /// through because they are written for end users; internals are not.
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::InvalidInput(msg) => msg.clone(),
            PaymentError::Stripe(msg) if !msg.is_empty() => msg.clone(),
            PaymentError::Stripe(_) => "Payment processing failed. Please try again.".into(),
            PaymentError::Config(_) => "Service configuration error.".into(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}

impl From<storefront_core::StorefrontError> for PaymentError {
    fn from(err: storefront_core::StorefrontError) -> Self {
        use storefront_core::StorefrontError;
        match err {
            StorefrontError::InvalidInput(msg) => PaymentError::InvalidInput(msg),
            StorefrontError::Config(msg) => PaymentError::Config(msg),
            other => PaymentError::Storage(other.to_string()),
        }
    }
}
