//! `stockyard-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model and chronological ordering of dated records.

pub mod chronology;
pub mod entity;
pub mod error;
pub mod id;

pub use chronology::{Chronological, latest, sort_chronologically};
pub use entity::{Entity, position_of};
pub use error::{DomainError, DomainResult};
pub use id::{CashEntryId, ClassId, MovementId, ProjectId, PurchaseItemId, UnitId};
