use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::allocations::allocations_errors::AllocationError;
use crate::allocations::allocations_model::{
    AllocationFilter, AllocationRequest, BeneficiaryAllocationSummary, FundAllocationRecord,
    FundAllocationRecordDb,
};
use crate::allocations::allocations_repository::AllocationRepository;
use crate::audit::{AuditLogRepository, NewAuditEntry};
use crate::beneficiaries::beneficiaries_model::BeneficiaryStatus;
use crate::beneficiaries::BeneficiaryRepository;
use crate::db::{get_connection, DbPool};
use crate::donations::donations_model::PaymentStatus;
use crate::donations::DonationRepository;
use crate::errors::{Error, Result};

/// Service for fund allocation bookkeeping.
///
/// Allocations are a post-hoc accounting step: they are only permitted once
/// the beneficiary has been archived, on every call path. The per-donation
/// cap (total allocated never exceeds the donation's accepted amount) is
/// enforced under the write transaction.
pub struct AllocationService {
    pool: Arc<DbPool>,
    allocation_repository: AllocationRepository,
    donation_repository: DonationRepository,
    beneficiary_repository: BeneficiaryRepository,
    audit_log: AuditLogRepository,
}

impl AllocationService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        AllocationService {
            allocation_repository: AllocationRepository::new(pool.clone()),
            donation_repository: DonationRepository::new(pool.clone()),
            beneficiary_repository: BeneficiaryRepository::new(pool.clone()),
            audit_log: AuditLogRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn create_allocation(
        &self,
        actor_id: &str,
        request: AllocationRequest,
    ) -> Result<FundAllocationRecord> {
        request.validate().map_err(Error::Allocation)?;

        let mut conn = get_connection(&self.pool)?;

        let created = conn.immediate_transaction::<FundAllocationRecord, Error, _>(|conn| {
            let beneficiary = self
                .beneficiary_repository
                .get_by_id_with_conn(conn, &request.beneficiary_id)?;

            if beneficiary.status != BeneficiaryStatus::Archived {
                return Err(AllocationError::BeneficiaryNotArchived(beneficiary.id).into());
            }

            if let Some(ref donation_id) = request.donation_transaction_id {
                self.validate_against_donation(conn, donation_id, request.amount, None)?;
            }

            self.allocation_repository
                .insert_with_conn(conn, FundAllocationRecordDb::from_request(&request))
        })?;

        debug!("Created allocation {} for {}", created.id, created.beneficiary_id);

        self.audit_log.record(NewAuditEntry {
            actor_id: actor_id.to_string(),
            action_type: "CREATE_ALLOCATION".to_string(),
            entity_type: "fund_allocation".to_string(),
            entity_id: created.id.clone(),
            description: format!("Created {} allocation", created.amount),
            old_values: None,
            new_values: serde_json::to_value(&created).ok(),
        });

        Ok(created)
    }

    pub fn update_allocation(
        &self,
        actor_id: &str,
        allocation_id: &str,
        request: AllocationRequest,
    ) -> Result<FundAllocationRecord> {
        request.validate().map_err(Error::Allocation)?;

        let mut conn = get_connection(&self.pool)?;

        let (before, after) =
            conn.immediate_transaction::<(FundAllocationRecord, FundAllocationRecord), Error, _>(
                |conn| {
                    let existing = self
                        .allocation_repository
                        .get_by_id_with_conn(conn, allocation_id)?;

                    // The donation attribution is immutable; re-validate the
                    // new amount against it, excluding this record's own
                    // prior contribution.
                    if let Some(ref donation_id) = existing.donation_transaction_id {
                        self.validate_against_donation(
                            conn,
                            donation_id,
                            request.amount,
                            Some(allocation_id),
                        )?;
                    }

                    let updated = self.allocation_repository.update_with_conn(
                        conn,
                        allocation_id,
                        &request,
                    )?;

                    Ok((existing, updated))
                },
            )?;

        self.audit_log.record(NewAuditEntry {
            actor_id: actor_id.to_string(),
            action_type: "UPDATE_ALLOCATION".to_string(),
            entity_type: "fund_allocation".to_string(),
            entity_id: allocation_id.to_string(),
            description: format!("Updated allocation {}", allocation_id),
            old_values: serde_json::to_value(&before).ok(),
            new_values: serde_json::to_value(&after).ok(),
        });

        Ok(after)
    }

    pub fn delete_allocation(&self, actor_id: &str, allocation_id: &str) -> Result<()> {
        let existing = self.allocation_repository.get_by_id(allocation_id)?;

        self.allocation_repository.delete(allocation_id)?;

        self.audit_log.record(NewAuditEntry {
            actor_id: actor_id.to_string(),
            action_type: "DELETE_ALLOCATION".to_string(),
            entity_type: "fund_allocation".to_string(),
            entity_id: allocation_id.to_string(),
            description: format!("Deleted {} allocation", existing.amount),
            old_values: serde_json::to_value(&existing).ok(),
            new_values: None,
        });

        Ok(())
    }

    pub fn get_allocation(&self, allocation_id: &str) -> Result<FundAllocationRecord> {
        self.allocation_repository.get_by_id(allocation_id)
    }

    pub fn list_allocations(&self, filter: &AllocationFilter) -> Result<Vec<FundAllocationRecord>> {
        self.allocation_repository.list(filter)
    }

    /// Derived per-beneficiary view. Remaining-to-allocate is computed from
    /// donation-covered amounts, not total allocation cost: external funding
    /// does not consume raised donations.
    pub fn get_beneficiary_summary(
        &self,
        beneficiary_id: &str,
    ) -> Result<BeneficiaryAllocationSummary> {
        let beneficiary = self.beneficiary_repository.get_by_id(beneficiary_id)?;
        let allocations = self
            .allocation_repository
            .list_for_beneficiary(beneficiary_id)?;

        let total_allocated: Decimal = allocations.iter().map(|a| a.amount).sum();
        let total_donation_covered = self
            .allocation_repository
            .total_donation_covered_for_beneficiary(beneficiary_id)?;

        let remaining_to_allocate = beneficiary.amount_raised - total_donation_covered;
        let remaining_to_raise = beneficiary.remaining_to_raise();

        Ok(BeneficiaryAllocationSummary {
            beneficiary,
            total_allocated,
            total_donation_covered,
            remaining_to_allocate,
            remaining_to_raise,
            allocations,
        })
    }

    /// Enforces the per-donation cap under the caller's write transaction:
    /// the donation must exist and be settled, and the new amount must fit
    /// into what is left of its accepted amount.
    fn validate_against_donation(
        &self,
        conn: &mut SqliteConnection,
        donation_id: &str,
        amount: Decimal,
        exclude_allocation_id: Option<&str>,
    ) -> Result<Decimal> {
        let donation = self
            .donation_repository
            .get_by_id_with_conn(conn, donation_id)?;

        if donation.payment_status != PaymentStatus::Success {
            return Err(AllocationError::NotSettled(donation_id.to_string()).into());
        }

        let already_allocated = self.allocation_repository.total_for_donation_with_conn(
            conn,
            donation_id,
            exclude_allocation_id,
        )?;

        let remaining = donation.accepted_amount - already_allocated;
        if amount > remaining {
            return Err(AllocationError::ExceedsRemaining {
                remaining: remaining.max(Decimal::ZERO),
            }
            .into());
        }

        Ok(remaining)
    }
}
