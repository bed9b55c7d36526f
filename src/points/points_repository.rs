use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::points::points_model::{NewPointEntry, PointLedgerEntry, PointLedgerEntryDb};
use crate::schema::point_ledger;
use crate::schema::point_ledger::dsl::*;

pub struct PointLedgerRepository {
    pool: Arc<DbPool>,
}

impl PointLedgerRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        PointLedgerRepository { pool }
    }

    pub fn entries_for_donor(&self, donor: &str) -> Result<Vec<PointLedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;
        self.entries_for_donor_with_conn(&mut conn, donor)
    }

    /// Variant usable inside an open transaction, so gating reads see the
    /// transaction's view of the ledger.
    pub fn entries_for_donor_with_conn(
        &self,
        conn: &mut SqliteConnection,
        donor: &str,
    ) -> Result<Vec<PointLedgerEntry>> {
        let rows = point_ledger::table
            .filter(donor_id.eq(donor))
            .order(created_at.asc())
            .load::<PointLedgerEntryDb>(conn)?;

        Ok(rows.into_iter().map(PointLedgerEntry::from).collect())
    }

    /// Appends a ledger entry inside the caller's transaction.
    pub fn insert_with_conn(
        &self,
        conn: &mut SqliteConnection,
        new_entry: NewPointEntry,
    ) -> Result<PointLedgerEntry> {
        let db_row: PointLedgerEntryDb = new_entry.into();

        let inserted = diesel::insert_into(point_ledger::table)
            .values(&db_row)
            .returning(point_ledger::all_columns)
            .get_result::<PointLedgerEntryDb>(conn)?;

        Ok(inserted.into())
    }
}
