use diesel::prelude::*;
use log::error;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::audit_log;
use crate::schema::audit_log::dsl::*;

use super::audit_model::{AuditEntry, AuditEntryDb, NewAuditEntry};

pub struct AuditLogRepository {
    pool: Arc<DbPool>,
}

impl AuditLogRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        AuditLogRepository { pool }
    }

    /// Records an audit entry. Best-effort: a failure to write the entry is
    /// logged and swallowed, it must never fail the primary operation.
    pub fn record(&self, entry: NewAuditEntry) {
        if let Err(e) = self.try_record(entry) {
            error!("Failed to write audit entry: {}", e);
        }
    }

    fn try_record(&self, entry: NewAuditEntry) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let db_entry: AuditEntryDb = entry.into();

        diesel::insert_into(audit_log::table)
            .values(&db_entry)
            .execute(&mut conn)?;

        Ok(())
    }

    pub fn entries_for_entity(
        &self,
        entity_type_filter: &str,
        entity_id_filter: &str,
    ) -> Result<Vec<AuditEntry>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = audit_log::table
            .filter(entity_type.eq(entity_type_filter))
            .filter(entity_id.eq(entity_id_filter))
            .order(created_at.desc())
            .load::<AuditEntryDb>(&mut conn)?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}
