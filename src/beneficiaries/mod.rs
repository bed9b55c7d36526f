pub mod beneficiaries_errors;
pub mod beneficiaries_model;
pub mod beneficiaries_repository;
pub mod beneficiaries_service;

pub use beneficiaries_errors::BeneficiaryError;
pub use beneficiaries_model::{BeneficiaryProfile, BeneficiaryStatus, NewBeneficiary};
pub use beneficiaries_repository::BeneficiaryRepository;
pub use beneficiaries_service::BeneficiaryService;
