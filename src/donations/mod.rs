pub mod donations_errors;
pub mod donations_model;
pub mod donations_repository;
pub mod donations_service;

pub use donations_errors::DonationError;
pub use donations_model::{DonationReceipt, DonationRecord, DonationRequest, PaymentStatus};
pub use donations_repository::DonationRepository;
pub use donations_service::DonationService;
