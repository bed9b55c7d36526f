pub mod db;

pub mod allocations;
pub mod audit;
pub mod beneficiaries;
pub mod donations;
pub mod payments;
pub mod points;
pub mod rewards;

pub mod constants;
pub mod errors;
pub mod schema;

pub use errors::{Error, Result};
