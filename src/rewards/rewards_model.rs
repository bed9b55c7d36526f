use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

pub const REWARD_ACTIVE: &str = "Active";
pub const REWARD_ARCHIVED: &str = "Archived";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardStatus {
    Active,
    Archived,
}

impl RewardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardStatus::Active => REWARD_ACTIVE,
            RewardStatus::Archived => REWARD_ARCHIVED,
        }
    }
}

impl From<&str> for RewardStatus {
    fn from(s: &str) -> Self {
        match s {
            REWARD_ACTIVE => RewardStatus::Active,
            _ => RewardStatus::Archived,
        }
    }
}

/// Catalogue entry. `quantity: None` means unlimited stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardItem {
    pub id: String,
    pub title: String,
    pub partner_name: String,
    pub points_required: i64,
    pub quantity: Option<i64>,
    pub status: RewardStatus,
    pub validity_months: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a catalogue entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub partner_name: String,
    pub points_required: i64,
    pub quantity: Option<i64>,
    pub validity_months: i32,
}

impl NewReward {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Reward title cannot be empty".to_string(),
            )));
        }
        if self.points_required <= 0 {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Points required must be positive".to_string(),
            )));
        }
        if self.validity_months <= 0 {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Validity months must be positive".to_string(),
            )));
        }
        if let Some(q) = self.quantity {
            if q < 0 {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Quantity cannot be negative".to_string(),
                )));
            }
        }
        Ok(())
    }
}

/// Input model for catalogue management updates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardUpdate {
    pub points_required: i64,
    pub quantity: Option<i64>,
    pub status: RewardStatus,
    pub validity_months: i32,
}

/// Immutable record of an issued redemption
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRecord {
    pub id: String,
    pub donor_id: String,
    pub reward_id: String,
    pub reward_title: String,
    pub points_spent: i64,
    pub redemption_code: String,
    pub issued_at: NaiveDateTime,
    pub expiry_date: NaiveDateTime,
}

/// Returned to the caller on successful redemption
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionReceipt {
    pub redemption_id: String,
    pub redemption_code: String,
    pub points_spent: i64,
    pub expiry_date: NaiveDateTime,
}

/// Database model for reward items
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::reward_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RewardItemDb {
    pub id: String,
    pub title: String,
    pub partner_name: String,
    pub points_required: i64,
    pub quantity: Option<i64>,
    pub status: String,
    pub validity_months: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<RewardItemDb> for RewardItem {
    fn from(db: RewardItemDb) -> Self {
        RewardItem {
            id: db.id,
            title: db.title,
            partner_name: db.partner_name,
            points_required: db.points_required,
            quantity: db.quantity,
            status: RewardStatus::from(db.status.as_str()),
            validity_months: db.validity_months,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewReward> for RewardItemDb {
    fn from(domain: NewReward) -> Self {
        let now = chrono::Utc::now().naive_utc();
        RewardItemDb {
            id: domain.id.unwrap_or_default(),
            title: domain.title,
            partner_name: domain.partner_name,
            points_required: domain.points_required,
            quantity: domain.quantity,
            status: RewardStatus::Active.as_str().to_string(),
            validity_months: domain.validity_months,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Database model for redemption records
#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::redemption_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RedemptionRecordDb {
    pub id: String,
    pub donor_id: String,
    pub reward_id: String,
    pub reward_title: String,
    pub points_spent: i64,
    pub redemption_code: String,
    pub issued_at: NaiveDateTime,
    pub expiry_date: NaiveDateTime,
}

impl From<RedemptionRecordDb> for RedemptionRecord {
    fn from(db: RedemptionRecordDb) -> Self {
        RedemptionRecord {
            id: db.id,
            donor_id: db.donor_id,
            reward_id: db.reward_id,
            reward_title: db.reward_title,
            points_spent: db.points_spent,
            redemption_code: db.redemption_code,
            issued_at: db.issued_at,
            expiry_date: db.expiry_date,
        }
    }
}
