use rust_decimal::Decimal;
use thiserror::Error;

/// Custom error type for fund allocation operations
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Allocation not found: {0}")]
    NotFound(String),

    #[error("Donation transaction was not settled successfully")]
    NotSettled(String),

    #[error("Allocation amount exceeds remaining donation. Remaining: {remaining}")]
    ExceedsRemaining { remaining: Decimal },

    #[error("Fund allocation is only allowed for archived beneficiaries")]
    BeneficiaryNotArchived(String),

    #[error("Invalid allocation data: {0}")]
    InvalidData(String),
}
