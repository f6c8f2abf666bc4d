//! Infrastructure layer: repositories, database pool, application services.

pub mod cash_service;
pub mod db;
pub mod error;
pub mod repository;
pub mod stock_service;


pub use cash_service::CashPostingService;
pub use db::{Database, DatabaseConfig};
pub use error::ServiceError;
pub use repository::{
    CashLedgerRepository, PurchaseItemRepository, ReferenceRepository, StockMovementRepository,
    StoreError,
};
pub use stock_service::{CascadeReport, StockService};
