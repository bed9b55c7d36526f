use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::rewards::rewards_errors::RewardError;
use crate::rewards::rewards_model::{
    NewReward, RedemptionRecord, RedemptionRecordDb, RewardItem, RewardItemDb, RewardStatus,
    RewardUpdate,
};
use crate::schema::{redemption_records, reward_items};

pub struct RewardRepository {
    pool: Arc<DbPool>,
}

impl RewardRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        RewardRepository { pool }
    }

    pub fn insert(&self, mut new_reward: NewReward) -> Result<RewardItem> {
        let mut conn = get_connection(&self.pool)?;

        if new_reward.id.is_none() {
            new_reward.id = Some(Uuid::new_v4().to_string());
        }

        let db_row: RewardItemDb = new_reward.into();

        let inserted = diesel::insert_into(reward_items::table)
            .values(&db_row)
            .returning(reward_items::all_columns)
            .get_result::<RewardItemDb>(&mut conn)?;

        Ok(inserted.into())
    }

    pub fn get_by_id(&self, reward_id: &str) -> Result<RewardItem> {
        let mut conn = get_connection(&self.pool)?;
        self.get_by_id_with_conn(&mut conn, reward_id)
    }

    pub fn get_by_id_with_conn(
        &self,
        conn: &mut SqliteConnection,
        reward_id: &str,
    ) -> Result<RewardItem> {
        let row = reward_items::table
            .find(reward_id)
            .first::<RewardItemDb>(conn)
            .optional()?
            .ok_or_else(|| RewardError::NotFound(reward_id.to_string()))?;

        Ok(row.into())
    }

    /// Active catalogue, cheapest rewards first
    pub fn list_active(&self) -> Result<Vec<RewardItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = reward_items::table
            .filter(reward_items::status.eq(RewardStatus::Active.as_str()))
            .order(reward_items::points_required.asc())
            .load::<RewardItemDb>(&mut conn)?;
        Ok(rows.into_iter().map(RewardItem::from).collect())
    }

    pub fn list_all(&self) -> Result<Vec<RewardItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = reward_items::table
            .order(reward_items::created_at.desc())
            .load::<RewardItemDb>(&mut conn)?;
        Ok(rows.into_iter().map(RewardItem::from).collect())
    }

    pub fn update(&self, reward_id: &str, update: RewardUpdate) -> Result<RewardItem> {
        let mut conn = get_connection(&self.pool)?;

        // Auto-archive when the managed quantity hits zero
        let new_status = match update.quantity {
            Some(0) => RewardStatus::Archived,
            _ => update.status,
        };

        let affected = diesel::update(reward_items::table.find(reward_id))
            .set((
                reward_items::points_required.eq(update.points_required),
                reward_items::quantity.eq(update.quantity),
                reward_items::status.eq(new_status.as_str()),
                reward_items::validity_months.eq(update.validity_months),
                reward_items::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;

        if affected == 0 {
            return Err(RewardError::NotFound(reward_id.to_string()).into());
        }

        self.get_by_id_with_conn(&mut conn, reward_id)
    }

    pub fn delete(&self, reward_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        Ok(diesel::delete(reward_items::table.find(reward_id)).execute(&mut conn)?)
    }

    pub fn redemption_count(&self, reward_id: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        Ok(redemption_records::table
            .filter(redemption_records::reward_id.eq(reward_id))
            .count()
            .get_result(&mut conn)?)
    }

    /// Decrements a finite quantity inside the caller's transaction and
    /// archives the reward at exactly zero.
    pub fn decrement_quantity_with_conn(
        &self,
        conn: &mut SqliteConnection,
        reward_id: &str,
        current_quantity: i64,
    ) -> Result<()> {
        let new_quantity = current_quantity - 1;
        let new_status = if new_quantity == 0 {
            RewardStatus::Archived
        } else {
            RewardStatus::Active
        };

        diesel::update(reward_items::table.find(reward_id))
            .set((
                reward_items::quantity.eq(Some(new_quantity)),
                reward_items::status.eq(new_status.as_str()),
                reward_items::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        Ok(())
    }

    pub fn insert_redemption_with_conn(
        &self,
        conn: &mut SqliteConnection,
        donor: &str,
        reward: &RewardItem,
        code: &str,
        expiry: NaiveDateTime,
    ) -> Result<RedemptionRecord> {
        let db_row = RedemptionRecordDb {
            id: Uuid::new_v4().to_string(),
            donor_id: donor.to_string(),
            reward_id: reward.id.clone(),
            reward_title: reward.title.clone(),
            points_spent: reward.points_required,
            redemption_code: code.to_string(),
            issued_at: chrono::Utc::now().naive_utc(),
            expiry_date: expiry,
        };

        let inserted = diesel::insert_into(redemption_records::table)
            .values(&db_row)
            .returning(redemption_records::all_columns)
            .get_result::<RedemptionRecordDb>(conn)?;

        Ok(inserted.into())
    }

    pub fn redemptions_for_donor(&self, donor: &str) -> Result<Vec<RedemptionRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = redemption_records::table
            .filter(redemption_records::donor_id.eq(donor))
            .order(redemption_records::issued_at.desc())
            .load::<RedemptionRecordDb>(&mut conn)?;
        Ok(rows.into_iter().map(RedemptionRecord::from).collect())
    }
}
