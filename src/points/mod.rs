pub mod points_model;
pub mod points_repository;
pub mod points_service;

pub use points_model::{
    NewPointEntry, PointBalance, PointKind, PointLedgerEntry, PointSource,
};
pub use points_repository::PointLedgerRepository;
pub use points_service::PointsService;
