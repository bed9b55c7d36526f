use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use crate::allocations::allocations_errors::AllocationError;
use crate::allocations::allocations_model::{
    AllocationFilter, AllocationRequest, FundAllocationRecord, FundAllocationRecordDb,
};
use crate::constants::MONEY_DECIMAL_PRECISION;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::fund_allocations;

pub struct AllocationRepository {
    pool: Arc<DbPool>,
}

impl AllocationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        AllocationRepository { pool }
    }

    pub fn insert_with_conn(
        &self,
        conn: &mut SqliteConnection,
        db_row: FundAllocationRecordDb,
    ) -> Result<FundAllocationRecord> {
        let inserted = diesel::insert_into(fund_allocations::table)
            .values(&db_row)
            .returning(fund_allocations::all_columns)
            .get_result::<FundAllocationRecordDb>(conn)?;

        Ok(inserted.into())
    }

    pub fn get_by_id(&self, allocation_id: &str) -> Result<FundAllocationRecord> {
        let mut conn = get_connection(&self.pool)?;
        self.get_by_id_with_conn(&mut conn, allocation_id)
    }

    pub fn get_by_id_with_conn(
        &self,
        conn: &mut SqliteConnection,
        allocation_id: &str,
    ) -> Result<FundAllocationRecord> {
        let row = fund_allocations::table
            .find(allocation_id)
            .first::<FundAllocationRecordDb>(conn)
            .optional()?
            .ok_or_else(|| AllocationError::NotFound(allocation_id.to_string()))?;

        Ok(row.into())
    }

    pub fn list(&self, filter: &AllocationFilter) -> Result<Vec<FundAllocationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = fund_allocations::table.into_boxed();

        if let Some(ref beneficiary) = filter.beneficiary_id {
            query = query.filter(fund_allocations::beneficiary_id.eq(beneficiary.clone()));
        }
        if let Some(ref donation) = filter.donation_transaction_id {
            query =
                query.filter(fund_allocations::donation_transaction_id.eq(donation.clone()));
        }
        if let Some(ref cat) = filter.category {
            query = query.filter(fund_allocations::category.eq(cat.clone()));
        }

        let rows = query
            .order((
                fund_allocations::allocation_date.desc(),
                fund_allocations::created_at.desc(),
            ))
            .load::<FundAllocationRecordDb>(&mut conn)?;

        Ok(rows.into_iter().map(FundAllocationRecord::from).collect())
    }

    pub fn list_for_beneficiary(&self, beneficiary: &str) -> Result<Vec<FundAllocationRecord>> {
        self.list(&AllocationFilter {
            beneficiary_id: Some(beneficiary.to_string()),
            ..Default::default()
        })
    }

    /// Total already allocated against one donation, optionally excluding a
    /// record (used when re-validating an update against its own prior
    /// contribution). Amounts are stored as text, so the fold happens here.
    pub fn total_for_donation_with_conn(
        &self,
        conn: &mut SqliteConnection,
        donation_id: &str,
        exclude_allocation_id: Option<&str>,
    ) -> Result<Decimal> {
        let mut query = fund_allocations::table
            .filter(fund_allocations::donation_transaction_id.eq(donation_id))
            .into_boxed();

        if let Some(exclude) = exclude_allocation_id {
            query = query.filter(fund_allocations::id.ne(exclude.to_string()));
        }

        let amounts: Vec<String> = query.select(fund_allocations::amount).load(conn)?;

        Ok(amounts
            .iter()
            .map(|a| Decimal::from_str(a).unwrap_or_default())
            .sum())
    }

    /// Total donation-covered spend for one beneficiary, for the
    /// remaining-to-allocate view.
    pub fn total_donation_covered_for_beneficiary(
        &self,
        beneficiary: &str,
    ) -> Result<Decimal> {
        let mut conn = get_connection(&self.pool)?;

        let amounts: Vec<String> = fund_allocations::table
            .filter(fund_allocations::beneficiary_id.eq(beneficiary))
            .select(fund_allocations::donation_covered_amount)
            .load(&mut conn)?;

        Ok(amounts
            .iter()
            .map(|a| Decimal::from_str(a).unwrap_or_default())
            .sum())
    }

    pub fn update_with_conn(
        &self,
        conn: &mut SqliteConnection,
        allocation_id: &str,
        request: &AllocationRequest,
    ) -> Result<FundAllocationRecord> {
        let now = chrono::Utc::now().naive_utc();

        diesel::update(fund_allocations::table.find(allocation_id))
            .set((
                fund_allocations::category.eq(request.category.trim().to_string()),
                fund_allocations::amount
                    .eq(request.amount.round_dp(MONEY_DECIMAL_PRECISION).to_string()),
                fund_allocations::donation_covered_amount.eq(request
                    .donation_covered_amount
                    .round_dp(MONEY_DECIMAL_PRECISION)
                    .to_string()),
                fund_allocations::external_covered_amount.eq(request
                    .external_covered_amount
                    .round_dp(MONEY_DECIMAL_PRECISION)
                    .to_string()),
                fund_allocations::external_funding_source
                    .eq(request.external_funding_source.clone()),
                fund_allocations::description.eq(request.description.clone()),
                fund_allocations::status.eq(request.status.as_str().to_string()),
                fund_allocations::allocation_date
                    .eq(request.allocation_date.unwrap_or_else(|| now.date())),
                fund_allocations::updated_at.eq(now),
            ))
            .execute(conn)?;

        self.get_by_id_with_conn(conn, allocation_id)
    }

    /// Hard delete. The cap invariant cannot be violated by removal, so no
    /// re-validation happens here.
    pub fn delete(&self, allocation_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        Ok(diesel::delete(fund_allocations::table.find(allocation_id)).execute(&mut conn)?)
    }
}
