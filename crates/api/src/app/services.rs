//! Store wiring: Postgres when configured, in-memory otherwise.

use std::sync::Arc;

use stockyard_infra::repository::{
    InMemoryCashLedgerRepository, InMemoryPurchaseItemRepository, InMemoryReferenceRepository,
    InMemoryStockMovementRepository, PostgresCashLedgerRepository, PostgresPurchaseItemRepository,
    PostgresReferenceRepository, PostgresStockMovementRepository,
};
use stockyard_infra::{CashPostingService, Database, DatabaseConfig, ServiceError, StockService};
use stockyard_stock::Direction;

/// Services shared by every handler.
#[derive(Debug)]
pub struct AppServices {
    pub stock: StockService,
    pub cash: CashPostingService,
    database: Option<Database>,
}

impl AppServices {
    /// Services over fresh in-memory stores (dev/test).
    pub fn in_memory() -> Result<Self, ServiceError> {
        let stock = StockService::new(
            Arc::new(InMemoryPurchaseItemRepository::new()),
            Arc::new(InMemoryStockMovementRepository::new(Direction::In)),
            Arc::new(InMemoryStockMovementRepository::new(Direction::Out)),
            Arc::new(InMemoryReferenceRepository::new()),
        )?;
        let cash = CashPostingService::new(Arc::new(InMemoryCashLedgerRepository::new()));
        Ok(Self {
            stock,
            cash,
            database: None,
        })
    }

    /// Services over one shared Postgres pool.
    pub fn postgres(database: Database) -> Result<Self, ServiceError> {
        let pool = database.pool().clone();
        let stock = StockService::new(
            Arc::new(PostgresPurchaseItemRepository::new(pool.clone())),
            Arc::new(PostgresStockMovementRepository::new(pool.clone(), Direction::In)),
            Arc::new(PostgresStockMovementRepository::new(pool.clone(), Direction::Out)),
            Arc::new(PostgresReferenceRepository::new(pool.clone())),
        )?;
        let cash = CashPostingService::new(Arc::new(PostgresCashLedgerRepository::new(pool)));
        Ok(Self {
            stock,
            cash,
            database: Some(database),
        })
    }

    pub fn storage(&self) -> &'static str {
        match self.database {
            Some(_) => "postgres",
            None => "in_memory",
        }
    }

    /// Close the database pool, if any.
    pub async fn shutdown(&self) {
        if let Some(db) = &self.database {
            db.close().await;
            tracing::info!("database pool closed");
        }
    }
}

/// Connect and bootstrap the schema when a database is configured.
pub async fn build_services(database: Option<&DatabaseConfig>) -> Result<AppServices, ServiceError> {
    match database {
        Some(config) => {
            let db = Database::connect(config).await?;
            db.apply_schema().await?;
            AppServices::postgres(db)
        }
        None => AppServices::in_memory(),
    }
}

