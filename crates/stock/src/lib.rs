//! Stock domain module.
//!
//! Purchased items, their stock-in / stock-out movements, the reference data
//! used to label them, and the aggregation that turns a movement history into
//! stock figures. Pure domain logic only (no IO, no HTTP, no storage).

pub mod aggregator;
pub mod movement;
pub mod purchase;
pub mod reference;

pub use aggregator::{
    MovementLine, StockAggregator, StockDetails, StockSummary, orphaned_movements, shortages,
};
pub use movement::{Direction, MovementPatch, NewStockMovement, StockMovement};
pub use purchase::{NewPurchaseItem, PurchaseItem, PurchaseItemPatch};
pub use reference::{
    ItemClass, ItemLabels, LabelSource, NewItemClass, NewUnit, ReferenceCatalog, Unit,
};
