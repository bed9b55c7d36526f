use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::donations::donations_errors::DonationError;
use crate::donations::donations_model::{DonationRecord, DonationRecordDb, NewDonationRecord};
use crate::errors::Result;
use crate::schema::donation_transactions;
use crate::schema::donation_transactions::dsl::*;

pub struct DonationRepository {
    pool: Arc<DbPool>,
}

impl DonationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        DonationRepository { pool }
    }

    /// Inserts the terminal record of a successful donation inside the
    /// caller's transaction.
    pub fn insert_with_conn(
        &self,
        conn: &mut SqliteConnection,
        new_record: NewDonationRecord,
    ) -> Result<DonationRecord> {
        let db_row: DonationRecordDb = new_record.into();

        let inserted = diesel::insert_into(donation_transactions::table)
            .values(&db_row)
            .returning(donation_transactions::all_columns)
            .get_result::<DonationRecordDb>(conn)?;

        Ok(inserted.into())
    }

    pub fn get_by_id(&self, donation_id: &str) -> Result<DonationRecord> {
        let mut conn = get_connection(&self.pool)?;
        self.get_by_id_with_conn(&mut conn, donation_id)
    }

    pub fn get_by_id_with_conn(
        &self,
        conn: &mut SqliteConnection,
        donation_id: &str,
    ) -> Result<DonationRecord> {
        let row = donation_transactions::table
            .find(donation_id)
            .first::<DonationRecordDb>(conn)
            .optional()?
            .ok_or_else(|| DonationError::NotFound(donation_id.to_string()))?;

        Ok(row.into())
    }

    pub fn list_for_donor(&self, donor: &str) -> Result<Vec<DonationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = donation_transactions::table
            .filter(donor_id.eq(donor))
            .order(created_at.desc())
            .load::<DonationRecordDb>(&mut conn)?;
        Ok(rows.into_iter().map(DonationRecord::from).collect())
    }

    pub fn list_for_beneficiary(&self, beneficiary: &str) -> Result<Vec<DonationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = donation_transactions::table
            .filter(beneficiary_id.eq(beneficiary))
            .order(created_at.desc())
            .load::<DonationRecordDb>(&mut conn)?;
        Ok(rows.into_iter().map(DonationRecord::from).collect())
    }
}
