use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::beneficiaries::beneficiaries_errors::BeneficiaryError;
use crate::beneficiaries::beneficiaries_model::{
    BeneficiaryProfile, BeneficiaryProfileDb, BeneficiaryStatus, NewBeneficiary,
};
use crate::constants::MONEY_DECIMAL_PRECISION;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::beneficiary_profiles;
use crate::schema::beneficiary_profiles::dsl::*;

pub struct BeneficiaryRepository {
    pool: Arc<DbPool>,
}

impl BeneficiaryRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        BeneficiaryRepository { pool }
    }

    pub fn insert(&self, mut new_beneficiary: NewBeneficiary) -> Result<BeneficiaryProfile> {
        let mut conn = get_connection(&self.pool)?;

        if new_beneficiary.id.is_none() {
            new_beneficiary.id = Some(Uuid::new_v4().to_string());
        }

        let db_row: BeneficiaryProfileDb = new_beneficiary.into();

        let inserted = diesel::insert_into(beneficiary_profiles::table)
            .values(&db_row)
            .returning(beneficiary_profiles::all_columns)
            .get_result::<BeneficiaryProfileDb>(&mut conn)?;

        Ok(inserted.into())
    }

    pub fn get_by_id(&self, beneficiary_id: &str) -> Result<BeneficiaryProfile> {
        let mut conn = get_connection(&self.pool)?;
        self.get_by_id_with_conn(&mut conn, beneficiary_id)
    }

    /// Variant usable inside an open transaction
    pub fn get_by_id_with_conn(
        &self,
        conn: &mut SqliteConnection,
        beneficiary_id: &str,
    ) -> Result<BeneficiaryProfile> {
        let row = beneficiary_profiles::table
            .find(beneficiary_id)
            .first::<BeneficiaryProfileDb>(conn)
            .optional()?
            .ok_or_else(|| BeneficiaryError::NotFound(beneficiary_id.to_string()))?;

        Ok(row.into())
    }

    pub fn list(&self) -> Result<Vec<BeneficiaryProfile>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = beneficiary_profiles::table
            .order(created_at.desc())
            .load::<BeneficiaryProfileDb>(&mut conn)?;
        Ok(rows.into_iter().map(BeneficiaryProfile::from).collect())
    }

    pub fn set_status(
        &self,
        beneficiary_id: &str,
        new_status: BeneficiaryStatus,
    ) -> Result<BeneficiaryProfile> {
        let mut conn = get_connection(&self.pool)?;

        let affected = diesel::update(beneficiary_profiles.find(beneficiary_id))
            .set((
                status.eq(new_status.as_str()),
                updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;

        if affected == 0 {
            return Err(BeneficiaryError::NotFound(beneficiary_id.to_string()).into());
        }

        self.get_by_id_with_conn(&mut conn, beneficiary_id)
    }

    /// Applies an accepted donation to the profile inside the caller's
    /// transaction: bumps `amount_raised` and flips the status to Funded when
    /// the goal is reached. Never reverts a Funded status.
    pub fn apply_donation_with_conn(
        &self,
        conn: &mut SqliteConnection,
        beneficiary_id: &str,
        accepted_amount: Decimal,
    ) -> Result<BeneficiaryProfile> {
        let current = self.get_by_id_with_conn(conn, beneficiary_id)?;

        let new_raised = current.amount_raised + accepted_amount;
        let new_status = if new_raised >= current.funding_goal
            && current.status == BeneficiaryStatus::Active
        {
            BeneficiaryStatus::Funded
        } else {
            current.status
        };

        diesel::update(beneficiary_profiles.find(beneficiary_id))
            .set((
                amount_raised.eq(new_raised.round_dp(MONEY_DECIMAL_PRECISION).to_string()),
                status.eq(new_status.as_str()),
                updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        self.get_by_id_with_conn(conn, beneficiary_id)
    }
}
