use chrono::{Months, Utc};
use diesel::Connection;
use log::{debug, error};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::beneficiaries::beneficiaries_model::BeneficiaryStatus;
use crate::beneficiaries::BeneficiaryRepository;
use crate::constants::{
    EARNED_POINTS_VALIDITY_MONTHS, MONEY_DECIMAL_PRECISION, POINTS_PER_CURRENCY_UNIT,
};
use crate::db::{get_connection, DbPool};
use crate::donations::donations_errors::DonationError;
use crate::donations::donations_model::{
    DonationReceipt, DonationRecord, DonationRequest, NewDonationRecord, PaymentStatus,
};
use crate::donations::donations_repository::DonationRepository;
use crate::errors::{Error, Result};
use crate::payments::PaymentGateway;
use crate::points::{NewPointEntry, PointKind, PointLedgerRepository, PointSource};

/// Service for donation intake.
///
/// The gateway charge happens before the write transaction is opened so the
/// single SQLite writer slot is never held across a slow external call. The
/// funding gap is re-derived inside the transaction before anything is
/// recorded.
pub struct DonationService {
    pool: Arc<DbPool>,
    beneficiary_repository: BeneficiaryRepository,
    donation_repository: DonationRepository,
    point_repository: PointLedgerRepository,
    gateway: Arc<dyn PaymentGateway>,
}

impl DonationService {
    pub fn new(pool: Arc<DbPool>, gateway: Arc<dyn PaymentGateway>) -> Self {
        DonationService {
            beneficiary_repository: BeneficiaryRepository::new(pool.clone()),
            donation_repository: DonationRepository::new(pool.clone()),
            point_repository: PointLedgerRepository::new(pool.clone()),
            pool,
            gateway,
        }
    }

    pub async fn process_donation(&self, request: DonationRequest) -> Result<DonationReceipt> {
        request.validate().map_err(Error::Donation)?;
        let donor_id = request.donor_id.clone().unwrap_or_default();

        let beneficiary = self
            .beneficiary_repository
            .get_by_id(&request.beneficiary_id)?;

        match beneficiary.status {
            BeneficiaryStatus::Active => {}
            BeneficiaryStatus::Funded => {
                return Err(DonationError::AlreadyFunded(beneficiary.id).into())
            }
            BeneficiaryStatus::Archived => {
                return Err(DonationError::Closed(beneficiary.id).into())
            }
        }

        let remaining = beneficiary.remaining_to_raise();
        if remaining <= Decimal::ZERO {
            return Err(DonationError::AlreadyFunded(beneficiary.id).into());
        }

        let accepted = request
            .requested_amount
            .min(remaining)
            .round_dp(MONEY_DECIMAL_PRECISION);

        debug!(
            "Charging {} for beneficiary {} (requested {}, remaining {})",
            accepted, beneficiary.id, request.requested_amount, remaining
        );

        let outcome = self
            .gateway
            .charge(
                accepted,
                &format!("Donation for {}", beneficiary.name),
                request.donor_email.trim(),
            )
            .await
            .map_err(Error::Gateway)?;

        // The money is captured from here on. Any failure below leaves the
        // charge without a local record and is logged for reconciliation.
        let mut conn = get_connection(&self.pool)?;
        let external_ref = outcome.external_ref.clone();

        let result = conn.immediate_transaction::<DonationReceipt, Error, _>(|conn| {
            let current = self
                .beneficiary_repository
                .get_by_id_with_conn(conn, &request.beneficiary_id)?;

            let gap = current.remaining_to_raise();
            if gap <= Decimal::ZERO {
                return Err(DonationError::AlreadyFunded(current.id).into());
            }

            // A concurrent donation may have shrunk the gap while the charge
            // was in flight; the recorded amount is clamped so the capping
            // invariant holds against the state being committed.
            let recorded = accepted.min(gap);
            if recorded < accepted {
                error!(
                    "Charge {} captured {} but only {} recorded against {}; reconciliation needed",
                    external_ref, accepted, recorded, current.id
                );
            }

            let record = self.donation_repository.insert_with_conn(
                conn,
                NewDonationRecord {
                    donor_id: donor_id.clone(),
                    beneficiary_id: current.id.clone(),
                    requested_amount: request.requested_amount,
                    accepted_amount: recorded,
                    donor_name: request.donor_name.clone(),
                    donor_email: request.donor_email.clone(),
                    external_payment_ref: external_ref.clone(),
                    payment_status: PaymentStatus::Success,
                },
            )?;

            let points = (recorded.floor().to_i64().unwrap_or(0)) * POINTS_PER_CURRENCY_UNIT;
            if points > 0 {
                let now = Utc::now().naive_utc();
                let expiry = now
                    .checked_add_months(Months::new(EARNED_POINTS_VALIDITY_MONTHS))
                    .unwrap_or(now);

                self.point_repository.insert_with_conn(
                    conn,
                    NewPointEntry {
                        donor_id: donor_id.clone(),
                        points,
                        kind: PointKind::Earn,
                        source: PointSource::Donation,
                        reference_id: record.id.clone(),
                        expiry_date: Some(expiry),
                    },
                )?;
            }

            let updated = self.beneficiary_repository.apply_donation_with_conn(
                conn,
                &request.beneficiary_id,
                recorded,
            )?;

            let adjusted = recorded < request.requested_amount;
            let funding_goal_reached = updated.status == BeneficiaryStatus::Funded;

            let mut message = "Donation processed successfully".to_string();
            if adjusted {
                message.push_str(&format!(
                    ". Donation capped to remaining required amount of {}",
                    recorded.round_dp(MONEY_DECIMAL_PRECISION)
                ));
            }
            if funding_goal_reached {
                message.push_str(". The funding goal has been reached!");
            }

            Ok(DonationReceipt {
                donation_id: record.id,
                requested_amount: request.requested_amount,
                accepted_amount: recorded,
                adjusted,
                external_payment_ref: external_ref.clone(),
                funding_goal_reached,
                message,
            })
        });

        if let Err(ref e) = result {
            error!(
                "Donation commit failed after charge {} was captured: {}",
                outcome.external_ref, e
            );
        }

        result
    }

    pub fn get_donation(&self, donation_id: &str) -> Result<DonationRecord> {
        self.donation_repository.get_by_id(donation_id)
    }

    pub fn get_donations_for_donor(&self, donor_id: &str) -> Result<Vec<DonationRecord>> {
        self.donation_repository.list_for_donor(donor_id)
    }

    pub fn get_donations_for_beneficiary(
        &self,
        beneficiary_id: &str,
    ) -> Result<Vec<DonationRecord>> {
        self.donation_repository.list_for_beneficiary(beneficiary_id)
    }
}
