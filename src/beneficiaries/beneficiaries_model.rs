use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::MONEY_DECIMAL_PRECISION;
use crate::errors::{Error, Result, ValidationError};

pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_FUNDED: &str = "Funded";
pub const STATUS_ARCHIVED: &str = "Archived";

/// Lifecycle status of a fundable beneficiary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeneficiaryStatus {
    Active,
    Funded,
    Archived,
}

impl BeneficiaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeneficiaryStatus::Active => STATUS_ACTIVE,
            BeneficiaryStatus::Funded => STATUS_FUNDED,
            BeneficiaryStatus::Archived => STATUS_ARCHIVED,
        }
    }
}

impl From<&str> for BeneficiaryStatus {
    fn from(s: &str) -> Self {
        match s {
            STATUS_ACTIVE => BeneficiaryStatus::Active,
            STATUS_FUNDED => BeneficiaryStatus::Funded,
            // Unknown statuses are treated as no longer accepting donations
            _ => BeneficiaryStatus::Archived,
        }
    }
}

/// Domain model for a fundable entity (e.g. an animal's care fund)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryProfile {
    pub id: String,
    pub name: String,
    pub funding_goal: Decimal,
    pub amount_raised: Decimal,
    pub status: BeneficiaryStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BeneficiaryProfile {
    /// How much is still needed to hit the funding goal. Negative values are
    /// clamped to zero.
    pub fn remaining_to_raise(&self) -> Decimal {
        (self.funding_goal - self.amount_raised).max(Decimal::ZERO)
    }
}

/// Input model for registering a new beneficiary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBeneficiary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub funding_goal: Decimal,
}

impl NewBeneficiary {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Beneficiary name cannot be empty".to_string(),
            )));
        }
        if self.funding_goal < Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Funding goal cannot be negative".to_string(),
            )));
        }
        Ok(())
    }
}

/// Database model for beneficiary profiles
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::beneficiary_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BeneficiaryProfileDb {
    pub id: String,
    pub name: String,
    pub funding_goal: String,
    pub amount_raised: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<BeneficiaryProfileDb> for BeneficiaryProfile {
    fn from(db: BeneficiaryProfileDb) -> Self {
        BeneficiaryProfile {
            id: db.id,
            name: db.name,
            funding_goal: Decimal::from_str(&db.funding_goal).unwrap_or_default(),
            amount_raised: Decimal::from_str(&db.amount_raised).unwrap_or_default(),
            status: BeneficiaryStatus::from(db.status.as_str()),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewBeneficiary> for BeneficiaryProfileDb {
    fn from(domain: NewBeneficiary) -> Self {
        let now = chrono::Utc::now().naive_utc();
        BeneficiaryProfileDb {
            id: domain.id.unwrap_or_default(),
            name: domain.name,
            funding_goal: domain
                .funding_goal
                .round_dp(MONEY_DECIMAL_PRECISION)
                .to_string(),
            amount_raised: Decimal::ZERO.to_string(),
            status: BeneficiaryStatus::Active.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
