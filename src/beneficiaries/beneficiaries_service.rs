use std::sync::Arc;

use crate::beneficiaries::beneficiaries_model::{
    BeneficiaryProfile, BeneficiaryStatus, NewBeneficiary,
};
use crate::beneficiaries::beneficiaries_repository::BeneficiaryRepository;
use crate::db::DbPool;
use crate::errors::Result;

/// Service for managing the beneficiary registry
pub struct BeneficiaryService {
    repository: BeneficiaryRepository,
}

impl BeneficiaryService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        BeneficiaryService {
            repository: BeneficiaryRepository::new(pool),
        }
    }

    pub fn register_beneficiary(&self, new_beneficiary: NewBeneficiary) -> Result<BeneficiaryProfile> {
        new_beneficiary.validate()?;
        self.repository.insert(new_beneficiary)
    }

    pub fn get_beneficiary(&self, beneficiary_id: &str) -> Result<BeneficiaryProfile> {
        self.repository.get_by_id(beneficiary_id)
    }

    pub fn list_beneficiaries(&self) -> Result<Vec<BeneficiaryProfile>> {
        self.repository.list()
    }

    /// Archives a beneficiary so it stops accepting donations and becomes
    /// eligible for post-hoc fund allocation.
    pub fn archive_beneficiary(&self, beneficiary_id: &str) -> Result<BeneficiaryProfile> {
        self.repository
            .set_status(beneficiary_id, BeneficiaryStatus::Archived)
    }
}
