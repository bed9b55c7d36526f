use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tempfile::TempDir;

use pawfund_core::db::{self, DbPool};
use pawfund_core::payments::{ChargeOutcome, GatewayError, PaymentGateway};

/// Provisions a throwaway SQLite database and returns a migrated pool. The
/// TempDir must be kept alive for the duration of the test.
pub fn setup_pool() -> (Arc<DbPool>, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let db_path =
        db::init(dir.path().to_str().unwrap()).expect("Failed to initialize database");

    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");

    (pool, dir)
}

/// In-process gateway double: captures charges unless told to decline.
pub struct StubGateway {
    decline: AtomicBool,
    charges: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        StubGateway {
            decline: AtomicBool::new(false),
            charges: AtomicUsize::new(0),
        }
    }

    pub fn declining() -> Self {
        StubGateway {
            decline: AtomicBool::new(true),
            charges: AtomicUsize::new(0),
        }
    }

    pub fn charge_count(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn charge(
        &self,
        _amount: Decimal,
        _description: &str,
        _payer_email: &str,
    ) -> Result<ChargeOutcome, GatewayError> {
        if self.decline.load(Ordering::SeqCst) {
            return Err(GatewayError::Declined("card declined".to_string()));
        }

        let n = self.charges.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ChargeOutcome {
            external_ref: format!("PAY-{:06}", n),
        })
    }
}
