use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::allocations::allocations_errors::AllocationError;
use crate::beneficiaries::BeneficiaryProfile;
use crate::constants::MONEY_DECIMAL_PRECISION;

pub const ALLOCATION_DRAFT: &str = "Draft";
pub const ALLOCATION_VERIFIED: &str = "Verified";
pub const ALLOCATION_PUBLISHED: &str = "Published";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AllocationStatus {
    #[default]
    Draft,
    Verified,
    Published,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Draft => ALLOCATION_DRAFT,
            AllocationStatus::Verified => ALLOCATION_VERIFIED,
            AllocationStatus::Published => ALLOCATION_PUBLISHED,
        }
    }
}

impl From<&str> for AllocationStatus {
    fn from(s: &str) -> Self {
        match s {
            ALLOCATION_VERIFIED => AllocationStatus::Verified,
            ALLOCATION_PUBLISHED => AllocationStatus::Published,
            _ => AllocationStatus::Draft,
        }
    }
}

/// Record of funds spent on a beneficiary, attributed back to the donation
/// that financed them. `donation_transaction_id: None` marks an unattributed
/// allocation (covered by external funding).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundAllocationRecord {
    pub id: String,
    pub donation_transaction_id: Option<String>,
    pub beneficiary_id: String,
    pub category: String,
    pub amount: Decimal,
    pub donation_covered_amount: Decimal,
    pub external_covered_amount: Decimal,
    pub external_funding_source: Option<String>,
    pub description: Option<String>,
    pub status: AllocationStatus,
    pub allocation_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Tolerant request payload: the mobile clients send a mix of camelCase and
/// snake_case keys, normalized here at the boundary. Core logic only ever
/// sees this typed struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    #[serde(default, alias = "donation_transaction_id", alias = "transactionID")]
    pub donation_transaction_id: Option<String>,
    #[serde(alias = "beneficiary_id")]
    pub beneficiary_id: String,
    pub category: String,
    pub amount: Decimal,
    #[serde(default, alias = "donation_covered_amount")]
    pub donation_covered_amount: Decimal,
    #[serde(default, alias = "external_covered_amount")]
    pub external_covered_amount: Decimal,
    #[serde(default, alias = "external_funding_source")]
    pub external_funding_source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: AllocationStatus,
    #[serde(default, alias = "allocation_date")]
    pub allocation_date: Option<NaiveDate>,
}

impl AllocationRequest {
    pub fn validate(&self) -> Result<(), AllocationError> {
        if self.amount <= Decimal::ZERO {
            return Err(AllocationError::InvalidData(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.donation_covered_amount < Decimal::ZERO
            || self.external_covered_amount < Decimal::ZERO
        {
            return Err(AllocationError::InvalidData(
                "covered amounts cannot be negative".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(AllocationError::InvalidData(
                "category is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Filters for listing allocations
#[derive(Debug, Clone, Default)]
pub struct AllocationFilter {
    pub beneficiary_id: Option<String>,
    pub donation_transaction_id: Option<String>,
    pub category: Option<String>,
}

/// Derived view for one beneficiary (spec: funds remaining to allocate is a
/// different figure from funds remaining to raise; the two must not be
/// conflated).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryAllocationSummary {
    pub beneficiary: BeneficiaryProfile,
    pub total_allocated: Decimal,
    pub total_donation_covered: Decimal,
    pub remaining_to_allocate: Decimal,
    pub remaining_to_raise: Decimal,
    pub allocations: Vec<FundAllocationRecord>,
}

/// Database model for fund allocations
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::fund_allocations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FundAllocationRecordDb {
    pub id: String,
    pub donation_transaction_id: Option<String>,
    pub beneficiary_id: String,
    pub category: String,
    pub amount: String,
    pub donation_covered_amount: String,
    pub external_covered_amount: String,
    pub external_funding_source: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub allocation_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<FundAllocationRecordDb> for FundAllocationRecord {
    fn from(db: FundAllocationRecordDb) -> Self {
        FundAllocationRecord {
            id: db.id,
            donation_transaction_id: db.donation_transaction_id,
            beneficiary_id: db.beneficiary_id,
            category: db.category,
            amount: Decimal::from_str(&db.amount).unwrap_or_default(),
            donation_covered_amount: Decimal::from_str(&db.donation_covered_amount)
                .unwrap_or_default(),
            external_covered_amount: Decimal::from_str(&db.external_covered_amount)
                .unwrap_or_default(),
            external_funding_source: db.external_funding_source,
            description: db.description,
            status: AllocationStatus::from(db.status.as_str()),
            allocation_date: db.allocation_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl FundAllocationRecordDb {
    pub fn from_request(request: &AllocationRequest) -> Self {
        let now = chrono::Utc::now().naive_utc();
        FundAllocationRecordDb {
            id: uuid::Uuid::new_v4().to_string(),
            donation_transaction_id: request.donation_transaction_id.clone(),
            beneficiary_id: request.beneficiary_id.clone(),
            category: request.category.trim().to_string(),
            amount: request.amount.round_dp(MONEY_DECIMAL_PRECISION).to_string(),
            donation_covered_amount: request
                .donation_covered_amount
                .round_dp(MONEY_DECIMAL_PRECISION)
                .to_string(),
            external_covered_amount: request
                .external_covered_amount
                .round_dp(MONEY_DECIMAL_PRECISION)
                .to_string(),
            external_funding_source: request.external_funding_source.clone(),
            description: request.description.clone(),
            status: request.status.as_str().to_string(),
            allocation_date: request.allocation_date.unwrap_or_else(|| now.date()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn request_accepts_snake_case_and_camel_case_keys() {
        let snake = r#"{
            "donation_transaction_id": "txn-1",
            "beneficiary_id": "ben-1",
            "category": "Medical",
            "amount": 120.0,
            "donation_covered_amount": 100.0,
            "external_covered_amount": 20.0
        }"#;
        let camel = r#"{
            "donationTransactionId": "txn-1",
            "beneficiaryId": "ben-1",
            "category": "Medical",
            "amount": 120.0,
            "donationCoveredAmount": 100.0,
            "externalCoveredAmount": 20.0
        }"#;

        let a: AllocationRequest = serde_json::from_str(snake).unwrap();
        let b: AllocationRequest = serde_json::from_str(camel).unwrap();

        assert_eq!(a.donation_transaction_id, b.donation_transaction_id);
        assert_eq!(a.donation_covered_amount, b.donation_covered_amount);
        assert_eq!(a.amount, dec!(120.0));
    }

    #[test]
    fn request_rejects_non_positive_amount() {
        let request = AllocationRequest {
            donation_transaction_id: None,
            beneficiary_id: "ben-1".to_string(),
            category: "Medical".to_string(),
            amount: dec!(0),
            donation_covered_amount: Decimal::ZERO,
            external_covered_amount: Decimal::ZERO,
            external_funding_source: None,
            description: None,
            status: AllocationStatus::Draft,
            allocation_date: None,
        };

        assert!(matches!(
            request.validate(),
            Err(AllocationError::InvalidData(_))
        ));
    }
}
