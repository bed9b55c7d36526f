use chrono::Utc;
use std::sync::Arc;

use crate::db::DbPool;
use crate::errors::Result;
use crate::points::points_model::{compute_balance, PointBalance, PointLedgerEntry};
use crate::points::points_repository::PointLedgerRepository;

/// Service for reading the point ledger. Balances are derived from rows on
/// every call, never cached.
pub struct PointsService {
    repository: PointLedgerRepository,
}

impl PointsService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        PointsService {
            repository: PointLedgerRepository::new(pool),
        }
    }

    pub fn get_balance(&self, donor_id: &str) -> Result<PointBalance> {
        let entries = self.repository.entries_for_donor(donor_id)?;
        Ok(compute_balance(&entries, Utc::now().naive_utc()))
    }

    pub fn get_history(&self, donor_id: &str) -> Result<Vec<PointLedgerEntry>> {
        self.repository.entries_for_donor(donor_id)
    }
}
