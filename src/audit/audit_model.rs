use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One admin action recorded against a ledger entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub actor_id: String,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

/// Input for recording an audit entry
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: String,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
}

/// Database model for audit entries
#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::audit_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditEntryDb {
    pub id: String,
    pub actor_id: String,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<AuditEntryDb> for AuditEntry {
    fn from(db: AuditEntryDb) -> Self {
        AuditEntry {
            id: db.id,
            actor_id: db.actor_id,
            action_type: db.action_type,
            entity_type: db.entity_type,
            entity_id: db.entity_id,
            description: db.description,
            old_values: db
                .old_values
                .and_then(|v| serde_json::from_str(&v).ok()),
            new_values: db
                .new_values
                .and_then(|v| serde_json::from_str(&v).ok()),
            created_at: db.created_at,
        }
    }
}

impl From<NewAuditEntry> for AuditEntryDb {
    fn from(domain: NewAuditEntry) -> Self {
        AuditEntryDb {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id: domain.actor_id,
            action_type: domain.action_type,
            entity_type: domain.entity_type,
            entity_id: domain.entity_id,
            description: domain.description,
            old_values: domain.old_values.map(|v| v.to_string()),
            new_values: domain.new_values.map(|v| v.to_string()),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
