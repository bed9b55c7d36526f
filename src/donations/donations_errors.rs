use thiserror::Error;

/// Custom error type for donation intake
#[derive(Debug, Error)]
pub enum DonationError {
    #[error("Authentication required to donate")]
    Unauthenticated,

    #[error("Invalid donation amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid donor email: {0}")]
    InvalidEmail(String),

    #[error("Donor name is required")]
    MissingDonorName,

    #[error("Donations for this beneficiary are closed")]
    Closed(String),

    #[error("Beneficiary has already reached its funding goal")]
    AlreadyFunded(String),

    #[error("Donation not found: {0}")]
    NotFound(String),
}
