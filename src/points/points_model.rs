use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub const KIND_EARN: &str = "EARN";
pub const KIND_SPEND: &str = "SPEND";
pub const KIND_ADJUST: &str = "ADJUST";

pub const SOURCE_DONATION: &str = "DONATION";
pub const SOURCE_REWARD_REDEMPTION: &str = "REWARD_REDEMPTION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    Earn,
    Spend,
    Adjust,
}

impl PointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointKind::Earn => KIND_EARN,
            PointKind::Spend => KIND_SPEND,
            PointKind::Adjust => KIND_ADJUST,
        }
    }
}

impl From<&str> for PointKind {
    fn from(s: &str) -> Self {
        match s {
            KIND_EARN => PointKind::Earn,
            KIND_SPEND => PointKind::Spend,
            _ => PointKind::Adjust,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointSource {
    Donation,
    RewardRedemption,
}

impl PointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointSource::Donation => SOURCE_DONATION,
            PointSource::RewardRedemption => SOURCE_REWARD_REDEMPTION,
        }
    }
}

impl From<&str> for PointSource {
    fn from(s: &str) -> Self {
        match s {
            SOURCE_REWARD_REDEMPTION => PointSource::RewardRedemption,
            _ => PointSource::Donation,
        }
    }
}

/// One append-only ledger row. Positive points are grants (EARN/ADJUST),
/// negative points are spends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLedgerEntry {
    pub id: String,
    pub donor_id: String,
    pub points: i64,
    pub kind: PointKind,
    pub source: PointSource,
    pub reference_id: String,
    pub expiry_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl PointLedgerEntry {
    fn counts_at(&self, now: NaiveDateTime) -> bool {
        match self.kind {
            // SPEND entries always count: they represent already-consumed
            // points, regardless of how old they are.
            PointKind::Spend => true,
            PointKind::Earn | PointKind::Adjust => match self.expiry_date {
                Some(expiry) => expiry > now,
                None => true,
            },
        }
    }
}

/// Input for appending a ledger entry
#[derive(Debug, Clone)]
pub struct NewPointEntry {
    pub donor_id: String,
    pub points: i64,
    pub kind: PointKind,
    pub source: PointSource,
    pub reference_id: String,
    pub expiry_date: Option<NaiveDateTime>,
}

/// Derived balance for one donor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBalance {
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
}

/// Folds ledger rows into the derived balance. The sum is commutative so the
/// result is independent of entry order; it is only sensitive to `now`
/// through grant expiry.
pub fn compute_balance(entries: &[PointLedgerEntry], now: NaiveDateTime) -> PointBalance {
    let raw: i64 = entries
        .iter()
        .filter(|e| e.counts_at(now))
        .map(|e| e.points)
        .sum();

    let total_earned: i64 = entries
        .iter()
        .filter(|e| e.kind == PointKind::Earn)
        .map(|e| e.points)
        .sum();

    let total_spent: i64 = entries
        .iter()
        .filter(|e| e.kind == PointKind::Spend)
        .map(|e| e.points)
        .sum::<i64>()
        .abs();

    PointBalance {
        balance: raw.max(0),
        total_earned,
        total_spent,
    }
}

/// Spendable balance used as the gate for redemption. Unlike the display
/// balance this is not clamped, so a negative ledger can never pass a
/// `balance >= points_required` check by accident.
pub fn spendable_balance(entries: &[PointLedgerEntry], now: NaiveDateTime) -> i64 {
    entries
        .iter()
        .filter(|e| e.counts_at(now))
        .map(|e| e.points)
        .sum()
}

/// Database model for point ledger rows
#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::point_ledger)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PointLedgerEntryDb {
    pub id: String,
    pub donor_id: String,
    pub points: i64,
    pub kind: String,
    pub source: String,
    pub reference_id: String,
    pub expiry_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl From<PointLedgerEntryDb> for PointLedgerEntry {
    fn from(db: PointLedgerEntryDb) -> Self {
        PointLedgerEntry {
            id: db.id,
            donor_id: db.donor_id,
            points: db.points,
            kind: PointKind::from(db.kind.as_str()),
            source: PointSource::from(db.source.as_str()),
            reference_id: db.reference_id,
            expiry_date: db.expiry_date,
            created_at: db.created_at,
        }
    }
}

impl From<NewPointEntry> for PointLedgerEntryDb {
    fn from(domain: NewPointEntry) -> Self {
        PointLedgerEntryDb {
            id: uuid::Uuid::new_v4().to_string(),
            donor_id: domain.donor_id,
            points: domain.points,
            kind: domain.kind.as_str().to_string(),
            source: domain.source.as_str().to_string(),
            reference_id: domain.reference_id,
            expiry_date: domain.expiry_date,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(points: i64, kind: PointKind, expiry: Option<NaiveDateTime>) -> PointLedgerEntry {
        PointLedgerEntry {
            id: uuid::Uuid::new_v4().to_string(),
            donor_id: "donor-1".to_string(),
            points,
            kind,
            source: PointSource::Donation,
            reference_id: "ref".to_string(),
            expiry_date: expiry,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn balance_excludes_expired_grants_but_keeps_spends() {
        let now = Utc::now().naive_utc();
        let entries = vec![
            entry(100, PointKind::Earn, Some(now - Duration::days(1))),
            entry(50, PointKind::Earn, Some(now + Duration::days(30))),
            entry(-30, PointKind::Spend, None),
        ];

        let balance = compute_balance(&entries, now);
        assert_eq!(balance.balance, 20);
        assert_eq!(balance.total_earned, 150);
        assert_eq!(balance.total_spent, 30);
    }

    #[test]
    fn displayed_balance_is_clamped_to_zero() {
        let now = Utc::now().naive_utc();
        let entries = vec![
            entry(100, PointKind::Earn, Some(now - Duration::days(1))),
            entry(-100, PointKind::Spend, None),
        ];

        // The grant expired but the spend still counts, so the raw sum is
        // negative. Display clamps, the spendable gate does not.
        assert_eq!(compute_balance(&entries, now).balance, 0);
        assert_eq!(spendable_balance(&entries, now), -100);
    }

    #[test]
    fn adjust_entries_count_toward_balance_but_not_earned_total() {
        let now = Utc::now().naive_utc();
        let entries = vec![
            entry(100, PointKind::Earn, None),
            entry(25, PointKind::Adjust, None),
        ];

        let balance = compute_balance(&entries, now);
        assert_eq!(balance.balance, 125);
        assert_eq!(balance.total_earned, 100);
    }

    #[test]
    fn balance_is_order_independent() {
        let now = Utc::now().naive_utc();
        let mut entries = vec![
            entry(100, PointKind::Earn, None),
            entry(-40, PointKind::Spend, None),
            entry(10, PointKind::Adjust, None),
        ];

        let forward = compute_balance(&entries, now);
        entries.reverse();
        let backward = compute_balance(&entries, now);

        assert_eq!(forward.balance, backward.balance);
    }
}
