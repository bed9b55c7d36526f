use chrono::NaiveDateTime;
use diesel::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::MONEY_DECIMAL_PRECISION;
use crate::donations::donations_errors::DonationError;

pub const PAYMENT_SUCCESS: &str = "Success";
pub const PAYMENT_FAILED: &str = "Failed";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => PAYMENT_SUCCESS,
            PaymentStatus::Failed => PAYMENT_FAILED,
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(s: &str) -> Self {
        match s {
            PAYMENT_SUCCESS => PaymentStatus::Success,
            _ => PaymentStatus::Failed,
        }
    }
}

/// Incoming donation request, before any validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    /// Resolved caller identity; `None` means the caller is not
    /// authenticated and the donation is rejected outright.
    pub donor_id: Option<String>,
    pub beneficiary_id: String,
    pub requested_amount: Decimal,
    pub donor_name: String,
    pub donor_email: String,
}

impl DonationRequest {
    /// Fail-fast validation: runs before any external call or lock, so a
    /// rejection here has zero side effects.
    pub fn validate(&self) -> Result<(), DonationError> {
        if self.donor_id.as_deref().map_or(true, |d| d.trim().is_empty()) {
            return Err(DonationError::Unauthenticated);
        }
        if self.requested_amount <= Decimal::ZERO {
            return Err(DonationError::InvalidAmount(format!(
                "amount must be positive, got {}",
                self.requested_amount
            )));
        }
        if !EMAIL_RE.is_match(self.donor_email.trim()) {
            return Err(DonationError::InvalidEmail(self.donor_email.clone()));
        }
        if self.donor_name.trim().is_empty() {
            return Err(DonationError::MissingDonorName);
        }
        Ok(())
    }
}

/// Result of an accepted donation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationReceipt {
    pub donation_id: String,
    pub requested_amount: Decimal,
    pub accepted_amount: Decimal,
    /// True when the accepted amount was capped below the requested amount
    pub adjusted: bool,
    pub external_payment_ref: String,
    pub funding_goal_reached: bool,
    pub message: String,
}

/// Append-only record of an accepted donation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub id: String,
    pub donor_id: String,
    pub beneficiary_id: String,
    pub requested_amount: Decimal,
    pub accepted_amount: Decimal,
    pub donor_name: String,
    pub donor_email: String,
    pub external_payment_ref: String,
    pub payment_status: PaymentStatus,
    pub created_at: NaiveDateTime,
}

/// Insert input, built by the service once the charge has been captured
#[derive(Debug, Clone)]
pub struct NewDonationRecord {
    pub donor_id: String,
    pub beneficiary_id: String,
    pub requested_amount: Decimal,
    pub accepted_amount: Decimal,
    pub donor_name: String,
    pub donor_email: String,
    pub external_payment_ref: String,
    pub payment_status: PaymentStatus,
}

/// Database model for donation transactions
#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::donation_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DonationRecordDb {
    pub id: String,
    pub donor_id: String,
    pub beneficiary_id: String,
    pub requested_amount: String,
    pub accepted_amount: String,
    pub donor_name: String,
    pub donor_email: String,
    pub external_payment_ref: String,
    pub payment_status: String,
    pub created_at: NaiveDateTime,
}

impl From<DonationRecordDb> for DonationRecord {
    fn from(db: DonationRecordDb) -> Self {
        DonationRecord {
            id: db.id,
            donor_id: db.donor_id,
            beneficiary_id: db.beneficiary_id,
            requested_amount: Decimal::from_str(&db.requested_amount).unwrap_or_default(),
            accepted_amount: Decimal::from_str(&db.accepted_amount).unwrap_or_default(),
            donor_name: db.donor_name,
            donor_email: db.donor_email,
            external_payment_ref: db.external_payment_ref,
            payment_status: PaymentStatus::from(db.payment_status.as_str()),
            created_at: db.created_at,
        }
    }
}

impl From<NewDonationRecord> for DonationRecordDb {
    fn from(domain: NewDonationRecord) -> Self {
        DonationRecordDb {
            id: uuid::Uuid::new_v4().to_string(),
            donor_id: domain.donor_id,
            beneficiary_id: domain.beneficiary_id,
            requested_amount: domain
                .requested_amount
                .round_dp(MONEY_DECIMAL_PRECISION)
                .to_string(),
            accepted_amount: domain
                .accepted_amount
                .round_dp(MONEY_DECIMAL_PRECISION)
                .to_string(),
            donor_name: domain.donor_name.trim().to_string(),
            donor_email: domain.donor_email.trim().to_string(),
            external_payment_ref: domain.external_payment_ref,
            payment_status: domain.payment_status.as_str().to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> DonationRequest {
        DonationRequest {
            donor_id: Some("donor-1".to_string()),
            beneficiary_id: "ben-1".to_string(),
            requested_amount: dec!(25),
            donor_name: "Jamie".to_string(),
            donor_email: "jamie@example.com".to_string(),
        }
    }

    #[test]
    fn rejects_missing_identity() {
        let mut req = request();
        req.donor_id = None;
        assert!(matches!(
            req.validate(),
            Err(DonationError::Unauthenticated)
        ));

        req.donor_id = Some("  ".to_string());
        assert!(matches!(
            req.validate(),
            Err(DonationError::Unauthenticated)
        ));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let mut req = request();
        req.requested_amount = dec!(0);
        assert!(matches!(
            req.validate(),
            Err(DonationError::InvalidAmount(_))
        ));

        req.requested_amount = dec!(-5);
        assert!(matches!(
            req.validate(),
            Err(DonationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn rejects_malformed_email() {
        let mut req = request();
        req.donor_email = "not-an-email".to_string();
        assert!(matches!(
            req.validate(),
            Err(DonationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(request().validate().is_ok());
    }
}
