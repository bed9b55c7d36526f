use std::sync::Arc;

use chrono::{Duration, Utc};

use pawfund_core::db;
use pawfund_core::points::{
    NewPointEntry, PointKind, PointLedgerRepository, PointSource, PointsService,
};
use pawfund_core::rewards::{NewReward, RewardError, RewardService, RewardStatus};
use pawfund_core::Error;

mod common;

fn seed_points(pool: &Arc<db::DbPool>, donor_id: &str, points: i64) {
    let repository = PointLedgerRepository::new(pool.clone());
    let mut conn = db::get_connection(pool).unwrap();
    repository
        .insert_with_conn(
            &mut conn,
            NewPointEntry {
                donor_id: donor_id.to_string(),
                points,
                kind: PointKind::Earn,
                source: PointSource::Donation,
                reference_id: "seed".to_string(),
                expiry_date: Some(Utc::now().naive_utc() + Duration::days(365)),
            },
        )
        .unwrap();
}

fn mug(quantity: Option<i64>, points_required: i64) -> NewReward {
    NewReward {
        id: None,
        title: "Shelter Mug".to_string(),
        partner_name: "Paws Cafe".to_string(),
        points_required,
        quantity,
        validity_months: 6,
    }
}

#[test]
fn redemption_issues_code_and_debits_the_ledger() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());
    let points = PointsService::new(pool.clone());

    seed_points(&pool, "donor-1", 200);
    let reward = rewards.create_reward(mug(Some(5), 120)).unwrap();

    let receipt = rewards.redeem("donor-1", &reward.id).unwrap();

    assert!(receipt.redemption_code.starts_with("RDM-"));
    assert_eq!(receipt.points_spent, 120);
    assert!(receipt.expiry_date > Utc::now().naive_utc());

    let balance = points.get_balance("donor-1").unwrap();
    assert_eq!(balance.balance, 80);
    assert_eq!(balance.total_spent, 120);

    let remaining = rewards.get_reward(&reward.id).unwrap();
    assert_eq!(remaining.quantity, Some(4));

    let history = rewards.get_redemption_history("donor-1").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reward_id, reward.id);
}

#[test]
fn redemption_fails_on_insufficient_points() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());

    seed_points(&pool, "donor-1", 50);
    let reward = rewards.create_reward(mug(None, 120)).unwrap();

    let err = rewards.redeem("donor-1", &reward.id).unwrap_err();
    assert!(matches!(
        err,
        Error::Reward(RewardError::InsufficientPoints {
            required: 120,
            balance: 50
        })
    ));

    // Nothing was debited or issued
    let history = rewards.get_redemption_history("donor-1").unwrap();
    assert!(history.is_empty());
}

#[test]
fn expired_grants_do_not_fund_a_redemption() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());
    let repository = PointLedgerRepository::new(pool.clone());

    let mut conn = db::get_connection(&pool).unwrap();
    repository
        .insert_with_conn(
            &mut conn,
            NewPointEntry {
                donor_id: "donor-1".to_string(),
                points: 500,
                kind: PointKind::Earn,
                source: PointSource::Donation,
                reference_id: "seed".to_string(),
                expiry_date: Some(Utc::now().naive_utc() - Duration::days(1)),
            },
        )
        .unwrap();
    drop(conn);

    let reward = rewards.create_reward(mug(None, 100)).unwrap();

    let err = rewards.redeem("donor-1", &reward.id).unwrap_err();
    assert!(matches!(
        err,
        Error::Reward(RewardError::InsufficientPoints { .. })
    ));
}

#[test]
fn last_unit_redemption_archives_the_reward() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());

    seed_points(&pool, "donor-1", 300);
    seed_points(&pool, "donor-2", 300);
    let reward = rewards.create_reward(mug(Some(1), 100)).unwrap();

    rewards.redeem("donor-1", &reward.id).unwrap();

    let drained = rewards.get_reward(&reward.id).unwrap();
    assert_eq!(drained.quantity, Some(0));
    assert_eq!(drained.status, RewardStatus::Archived);
    assert!(rewards.get_catalogue().unwrap().is_empty());

    let err = rewards.redeem("donor-2", &reward.id).unwrap_err();
    assert!(matches!(
        err,
        Error::Reward(RewardError::Inactive(_)) | Error::Reward(RewardError::OutOfStock(_))
    ));
}

#[test]
fn archived_reward_cannot_be_redeemed() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());

    seed_points(&pool, "donor-1", 300);
    let reward = rewards.create_reward(mug(None, 100)).unwrap();
    rewards
        .update_reward(
            &reward.id,
            pawfund_core::rewards::RewardUpdate {
                points_required: 100,
                quantity: None,
                status: RewardStatus::Archived,
                validity_months: 6,
            },
        )
        .unwrap();

    let err = rewards.redeem("donor-1", &reward.id).unwrap_err();
    assert!(matches!(err, Error::Reward(RewardError::Inactive(_))));
}

#[test]
fn concurrent_redemptions_of_last_unit_grant_exactly_one() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());

    seed_points(&pool, "donor-1", 150);
    seed_points(&pool, "donor-2", 150);
    let reward = rewards.create_reward(mug(Some(1), 100)).unwrap();

    let mut handles = Vec::new();
    for donor in ["donor-1", "donor-2"] {
        let pool = pool.clone();
        let reward_id = reward.id.clone();
        handles.push(std::thread::spawn(move || {
            RewardService::new(pool).redeem(donor, &reward_id)
        }));
    }

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("redeem thread panicked"))
        .collect();

    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let drained = rewards.get_reward(&reward.id).unwrap();
    assert_eq!(drained.quantity, Some(0));
}

#[test]
fn reward_with_redemptions_cannot_be_deleted() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());

    seed_points(&pool, "donor-1", 200);
    let reward = rewards.create_reward(mug(None, 100)).unwrap();
    rewards.redeem("donor-1", &reward.id).unwrap();

    let err = rewards.delete_reward(&reward.id).unwrap_err();
    assert!(matches!(err, Error::Reward(RewardError::HasRedemptions(_))));

    // Still retrievable after the refused delete
    assert!(rewards.get_reward(&reward.id).is_ok());
}

#[test]
fn catalogue_lists_active_rewards_cheapest_first() {
    let (pool, _dir) = common::setup_pool();
    let rewards = RewardService::new(pool.clone());

    rewards.create_reward(mug(None, 300)).unwrap();
    let mut cheap = mug(None, 50);
    cheap.title = "Sticker Pack".to_string();
    rewards.create_reward(cheap).unwrap();

    let catalogue = rewards.get_catalogue().unwrap();
    assert_eq!(catalogue.len(), 2);
    assert_eq!(catalogue[0].points_required, 50);
    assert_eq!(catalogue[1].points_required, 300);
}
