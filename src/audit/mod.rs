pub mod audit_model;
pub mod audit_repository;

pub use audit_model::{AuditEntry, NewAuditEntry};
pub use audit_repository::AuditLogRepository;
