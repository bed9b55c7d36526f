use thiserror::Error;

/// Custom error type for catalogue and redemption operations
#[derive(Debug, Error)]
pub enum RewardError {
    #[error("Reward not found: {0}")]
    NotFound(String),

    #[error("Reward is no longer active")]
    Inactive(String),

    #[error("Reward out of stock")]
    OutOfStock(String),

    #[error("Insufficient points balance: {required} required, {balance} available")]
    InsufficientPoints { required: i64, balance: i64 },

    #[error("Invalid reward data: {0}")]
    InvalidData(String),

    #[error("Cannot delete a reward with redemption history; archive it instead")]
    HasRedemptions(String),
}
