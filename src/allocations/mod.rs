pub mod allocations_errors;
pub mod allocations_model;
pub mod allocations_repository;
pub mod allocations_service;

pub use allocations_errors::AllocationError;
pub use allocations_model::{
    AllocationFilter, AllocationRequest, AllocationStatus, BeneficiaryAllocationSummary,
    FundAllocationRecord,
};
pub use allocations_repository::AllocationRepository;
pub use allocations_service::AllocationService;
