//! Persistence seams for purchase items, stock movements, cash entries and
//! reference data.
//!
//! Every trait is object-safe and `Send + Sync` so services can hold
//! `Arc<dyn ...>` and swap the in-memory stores for Postgres at startup.
//!
//! Stores own insertion order: `create` assigns the `sequence` that breaks
//! same-date ties in chronological reads.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use stockyard_cash::{CashChain, CashLedgerEntry, PostedEntry, ProjectScope, Register};
use stockyard_core::{CashEntryId, ClassId, MovementId, PurchaseItemId, UnitId};
use stockyard_stock::{Direction, ItemClass, PurchaseItem, ReferenceCatalog, StockMovement, Unit};

pub use in_memory::{
    InMemoryCashLedgerRepository, InMemoryPurchaseItemRepository, InMemoryReferenceRepository,
    InMemoryStockMovementRepository,
};
pub use postgres::{
    PostgresCashLedgerRepository, PostgresPurchaseItemRepository, PostgresReferenceRepository,
    PostgresStockMovementRepository,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("stored data is invalid: {0}")]
    Invalid(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PurchaseItemRepository: Send + Sync {
    /// All items in insertion order.
    async fn find_all(&self) -> StoreResult<Vec<PurchaseItem>>;
    async fn find_by_id(&self, id: PurchaseItemId) -> StoreResult<Option<PurchaseItem>>;
    async fn create(&self, item: PurchaseItem) -> StoreResult<PurchaseItem>;
    /// Replace the stored record with the same id.
    async fn update(&self, item: PurchaseItem) -> StoreResult<PurchaseItem>;
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: PurchaseItemId) -> StoreResult<bool>;
}

/// One movement table. Receipts and issuances live in two instances with
/// the same contract.
#[async_trait]
pub trait StockMovementRepository: Send + Sync {
    fn direction(&self) -> Direction;

    /// All movements, ordered by `(date, sequence)`.
    async fn find_all(&self) -> StoreResult<Vec<StockMovement>>;
    async fn find_by_id(&self, id: MovementId) -> StoreResult<Option<StockMovement>>;
    /// Movements of one purchase item, ordered by `(date, sequence)`.
    async fn find_by_purchase(&self, purchase_item_id: PurchaseItemId) -> StoreResult<Vec<StockMovement>>;
    /// Store `movement`; the returned record carries the assigned sequence.
    async fn create(&self, movement: StockMovement) -> StoreResult<StockMovement>;
    async fn update(&self, movement: StockMovement) -> StoreResult<StockMovement>;
    async fn delete(&self, id: MovementId) -> StoreResult<bool>;
    async fn delete_all(&self) -> StoreResult<u64>;
    async fn delete_by_purchase(&self, purchase_item_id: PurchaseItemId) -> StoreResult<u64>;
}

#[async_trait]
pub trait CashLedgerRepository: Send + Sync {
    /// Entries of one register ordered by `(date, sequence)`, optionally
    /// restricted to one project scope.
    async fn find_all(
        &self,
        register: Register,
        scope: Option<ProjectScope>,
    ) -> StoreResult<Vec<CashLedgerEntry>>;
    async fn find_by_id(&self, id: CashEntryId) -> StoreResult<Option<CashLedgerEntry>>;
    /// Persist a posted entry, assigning its id and insertion sequence.
    async fn create(&self, entry: PostedEntry) -> StoreResult<CashLedgerEntry>;
    async fn delete(&self, id: CashEntryId) -> StoreResult<bool>;
    /// Empty one register.
    async fn delete_all(&self, register: Register) -> StoreResult<u64>;
    /// Stored balance of the chain's latest entry by `(date, sequence)`, or 0.
    async fn last_balance(&self, chain: CashChain) -> StoreResult<i64>;
}

#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn list_units(&self) -> StoreResult<Vec<Unit>>;
    async fn list_classes(&self) -> StoreResult<Vec<ItemClass>>;
    async fn create_unit(&self, unit: Unit) -> StoreResult<Unit>;
    async fn create_class(&self, class: ItemClass) -> StoreResult<ItemClass>;
    async fn delete_unit(&self, id: UnitId) -> StoreResult<bool>;
    async fn delete_class(&self, id: ClassId) -> StoreResult<bool>;

    /// Snapshot of both tables for label resolution.
    async fn catalog(&self) -> StoreResult<ReferenceCatalog> {
        let units = self.list_units().await?;
        let classes = self.list_classes().await?;
        Ok(ReferenceCatalog::new(units, classes))
    }
}
