pub mod rewards_errors;
pub mod rewards_model;
pub mod rewards_repository;
pub mod rewards_service;

pub use rewards_errors::RewardError;
pub use rewards_model::{
    NewReward, RedemptionReceipt, RedemptionRecord, RewardItem, RewardStatus, RewardUpdate,
};
pub use rewards_repository::RewardRepository;
pub use rewards_service::RewardService;
