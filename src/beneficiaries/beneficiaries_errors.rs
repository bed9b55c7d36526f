use thiserror::Error;

/// Custom error type for beneficiary registry operations
#[derive(Debug, Error)]
pub enum BeneficiaryError {
    #[error("Beneficiary not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
