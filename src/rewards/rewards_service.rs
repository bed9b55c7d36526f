use chrono::{Months, Utc};
use diesel::Connection;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::REDEMPTION_CODE_PREFIX;
use crate::db::{get_connection, DbPool};
use crate::errors::{Error, Result};
use crate::points::points_model::spendable_balance;
use crate::points::{NewPointEntry, PointKind, PointLedgerRepository, PointSource};
use crate::rewards::rewards_errors::RewardError;
use crate::rewards::rewards_model::{
    NewReward, RedemptionReceipt, RedemptionRecord, RewardItem, RewardStatus, RewardUpdate,
};
use crate::rewards::rewards_repository::RewardRepository;

/// Service for the reward catalogue and redemption
pub struct RewardService {
    pool: Arc<DbPool>,
    reward_repository: RewardRepository,
    point_repository: PointLedgerRepository,
}

impl RewardService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        RewardService {
            reward_repository: RewardRepository::new(pool.clone()),
            point_repository: PointLedgerRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn get_catalogue(&self) -> Result<Vec<RewardItem>> {
        self.reward_repository.list_active()
    }

    pub fn get_all_rewards(&self) -> Result<Vec<RewardItem>> {
        self.reward_repository.list_all()
    }

    pub fn get_reward(&self, reward_id: &str) -> Result<RewardItem> {
        self.reward_repository.get_by_id(reward_id)
    }

    pub fn get_redemption_history(&self, donor_id: &str) -> Result<Vec<RedemptionRecord>> {
        self.reward_repository.redemptions_for_donor(donor_id)
    }

    pub fn create_reward(&self, new_reward: NewReward) -> Result<RewardItem> {
        new_reward.validate()?;
        self.reward_repository.insert(new_reward)
    }

    pub fn update_reward(&self, reward_id: &str, update: RewardUpdate) -> Result<RewardItem> {
        self.reward_repository.update(reward_id, update)
    }

    /// Deleting is refused once the reward has redemption history; those
    /// records reference it, so it has to be archived instead.
    pub fn delete_reward(&self, reward_id: &str) -> Result<()> {
        if self.reward_repository.redemption_count(reward_id)? > 0 {
            return Err(RewardError::HasRedemptions(reward_id.to_string()).into());
        }
        self.reward_repository.delete(reward_id)?;
        Ok(())
    }

    /// Redeems a reward for the donor. The whole sequence runs in one write
    /// transaction: the stock check, the balance check (re-read under the
    /// lock, never trusted from a prior read), the inventory decrement, the
    /// redemption record and the SPEND entry all commit or roll back
    /// together.
    pub fn redeem(&self, donor_id: &str, reward_id: &str) -> Result<RedemptionReceipt> {
        let mut conn = get_connection(&self.pool)?;

        conn.immediate_transaction::<RedemptionReceipt, Error, _>(|conn| {
            let reward = self.reward_repository.get_by_id_with_conn(conn, reward_id)?;

            if reward.status != RewardStatus::Active {
                return Err(RewardError::Inactive(reward.id).into());
            }
            if let Some(q) = reward.quantity {
                if q <= 0 {
                    return Err(RewardError::OutOfStock(reward.id).into());
                }
            }

            let now = Utc::now().naive_utc();
            let entries = self
                .point_repository
                .entries_for_donor_with_conn(conn, donor_id)?;
            let balance = spendable_balance(&entries, now);

            if balance < reward.points_required {
                return Err(RewardError::InsufficientPoints {
                    required: reward.points_required,
                    balance: balance.max(0),
                }
                .into());
            }

            if let Some(q) = reward.quantity {
                self.reward_repository
                    .decrement_quantity_with_conn(conn, &reward.id, q)?;
            }

            let code = format!(
                "{}-{}",
                REDEMPTION_CODE_PREFIX,
                Uuid::new_v4().simple()
            );
            let expiry = now
                .checked_add_months(Months::new(reward.validity_months.max(0) as u32))
                .unwrap_or(now);

            let redemption = self.reward_repository.insert_redemption_with_conn(
                conn, donor_id, &reward, &code, expiry,
            )?;

            self.point_repository.insert_with_conn(
                conn,
                NewPointEntry {
                    donor_id: donor_id.to_string(),
                    points: -reward.points_required,
                    kind: PointKind::Spend,
                    source: PointSource::RewardRedemption,
                    reference_id: redemption.id.clone(),
                    expiry_date: None,
                },
            )?;

            debug!(
                "Donor {} redeemed reward {} for {} points",
                donor_id, reward.id, reward.points_required
            );

            Ok(RedemptionReceipt {
                redemption_id: redemption.id,
                redemption_code: redemption.redemption_code,
                points_spent: redemption.points_spent,
                expiry_date: redemption.expiry_date,
            })
        })
    }
}
