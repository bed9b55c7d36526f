use thiserror::Error;

/// Custom error type for payment gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment was declined: {0}")]
    Declined(String),

    #[error("Payment gateway timed out")]
    Timeout,

    #[error("Payment gateway request failed: {0}")]
    Http(String),

    #[error("Payment gateway is not configured: {0}")]
    NotConfigured(String),
}
