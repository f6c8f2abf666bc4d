use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use stockyard_cash::{CashChain, CashLedgerEntry, PostedEntry, ProjectScope, Register};
use stockyard_core::{
    CashEntryId, ClassId, Entity, MovementId, PurchaseItemId, UnitId, latest, position_of,
    sort_chronologically,
};
use stockyard_stock::{Direction, ItemClass, PurchaseItem, StockMovement, Unit};

use super::{
    CashLedgerRepository, PurchaseItemRepository, ReferenceRepository, StockMovementRepository,
    StoreError, StoreResult,
};

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory purchase items, kept in insertion order.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPurchaseItemRepository {
    items: RwLock<Vec<PurchaseItem>>,
}

impl InMemoryPurchaseItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurchaseItemRepository for InMemoryPurchaseItemRepository {
    async fn find_all(&self) -> StoreResult<Vec<PurchaseItem>> {
        Ok(self.items.read().map_err(|_| poisoned())?.clone())
    }

    async fn find_by_id(&self, id: PurchaseItemId) -> StoreResult<Option<PurchaseItem>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(position_of(items.as_slice(), &id).map(|at| items[at].clone()))
    }

    async fn create(&self, item: PurchaseItem) -> StoreResult<PurchaseItem> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        if position_of(items.as_slice(), &item.id).is_some() {
            return Err(StoreError::Conflict(format!("purchase item {} already exists", item.id)));
        }
        items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, item: PurchaseItem) -> StoreResult<PurchaseItem> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let at = position_of(items.as_slice(), &item.id).ok_or(StoreError::NotFound)?;
        items[at] = item.clone();
        Ok(item)
    }

    async fn delete(&self, id: PurchaseItemId) -> StoreResult<bool> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let before = items.len();
        items.retain(|i| !i.is(&id));
        Ok(items.len() != before)
    }
}

/// In-memory movement table for one direction.
#[derive(Debug)]
pub struct InMemoryStockMovementRepository {
    direction: Direction,
    movements: RwLock<HashMap<MovementId, StockMovement>>,
    next_sequence: AtomicU64,
}

impl InMemoryStockMovementRepository {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            movements: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(1),
        }
    }

    fn collect_sorted<'a>(movements: impl Iterator<Item = &'a StockMovement>) -> Vec<StockMovement> {
        let mut out: Vec<StockMovement> = movements.cloned().collect();
        sort_chronologically(&mut out);
        out
    }
}

#[async_trait]
impl StockMovementRepository for InMemoryStockMovementRepository {
    fn direction(&self) -> Direction {
        self.direction
    }

    async fn find_all(&self) -> StoreResult<Vec<StockMovement>> {
        let movements = self.movements.read().map_err(|_| poisoned())?;
        Ok(Self::collect_sorted(movements.values()))
    }

    async fn find_by_id(&self, id: MovementId) -> StoreResult<Option<StockMovement>> {
        let movements = self.movements.read().map_err(|_| poisoned())?;
        Ok(movements.get(&id).cloned())
    }

    async fn find_by_purchase(&self, purchase_item_id: PurchaseItemId) -> StoreResult<Vec<StockMovement>> {
        let movements = self.movements.read().map_err(|_| poisoned())?;
        Ok(Self::collect_sorted(
            movements.values().filter(|m| m.purchase_item_id == purchase_item_id),
        ))
    }

    async fn create(&self, mut movement: StockMovement) -> StoreResult<StockMovement> {
        if movement.direction != self.direction {
            return Err(StoreError::Invalid(format!(
                "cannot store a `{}` movement in the `{}` table",
                movement.direction, self.direction
            )));
        }
        let mut movements = self.movements.write().map_err(|_| poisoned())?;
        if movements.contains_key(&movement.id) {
            return Err(StoreError::Conflict(format!("movement {} already exists", movement.id)));
        }
        movement.sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        movements.insert(movement.id, movement.clone());
        Ok(movement)
    }

    async fn update(&self, movement: StockMovement) -> StoreResult<StockMovement> {
        let mut movements = self.movements.write().map_err(|_| poisoned())?;
        let slot = movements.get_mut(&movement.id).ok_or(StoreError::NotFound)?;
        // Insertion order is fixed at creation.
        let updated = StockMovement {
            sequence: slot.sequence,
            direction: slot.direction,
            ..movement
        };
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: MovementId) -> StoreResult<bool> {
        let mut movements = self.movements.write().map_err(|_| poisoned())?;
        Ok(movements.remove(&id).is_some())
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let mut movements = self.movements.write().map_err(|_| poisoned())?;
        let removed = movements.len() as u64;
        movements.clear();
        Ok(removed)
    }

    async fn delete_by_purchase(&self, purchase_item_id: PurchaseItemId) -> StoreResult<u64> {
        let mut movements = self.movements.write().map_err(|_| poisoned())?;
        let before = movements.len();
        movements.retain(|_, m| m.purchase_item_id != purchase_item_id);
        Ok((before - movements.len()) as u64)
    }
}

/// In-memory petty-cash entries.
#[derive(Debug)]
pub struct InMemoryCashLedgerRepository {
    entries: RwLock<HashMap<CashEntryId, CashLedgerEntry>>,
    next_sequence: AtomicU64,
}

impl Default for InMemoryCashLedgerRepository {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(1),
        }
    }
}

impl InMemoryCashLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CashLedgerRepository for InMemoryCashLedgerRepository {
    async fn find_all(
        &self,
        register: Register,
        scope: Option<ProjectScope>,
    ) -> StoreResult<Vec<CashLedgerEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut out: Vec<CashLedgerEntry> = entries
            .values()
            .filter(|e| e.register == register && scope.is_none_or(|s| e.scope() == s))
            .cloned()
            .collect();
        sort_chronologically(&mut out);
        Ok(out)
    }

    async fn find_by_id(&self, id: CashEntryId) -> StoreResult<Option<CashLedgerEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(&id).cloned())
    }

    async fn create(&self, entry: PostedEntry) -> StoreResult<CashLedgerEntry> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let stored = entry.into_entry(CashEntryId::new(), sequence);
        entries.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: CashEntryId) -> StoreResult<bool> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(&id).is_some())
    }

    async fn delete_all(&self, register: Register) -> StoreResult<u64> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let before = entries.len();
        entries.retain(|_, e| e.register != register);
        Ok((before - entries.len()) as u64)
    }

    async fn last_balance(&self, chain: CashChain) -> StoreResult<i64> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(latest(entries.values().filter(|e| chain.contains(e)))
            .map(|e| e.balance)
            .unwrap_or(0))
    }
}

/// In-memory units and classes, listed in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryReferenceRepository {
    units: RwLock<Vec<Unit>>,
    classes: RwLock<Vec<ItemClass>>,
}

impl InMemoryReferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferenceRepository for InMemoryReferenceRepository {
    async fn list_units(&self) -> StoreResult<Vec<Unit>> {
        Ok(self.units.read().map_err(|_| poisoned())?.clone())
    }

    async fn list_classes(&self) -> StoreResult<Vec<ItemClass>> {
        Ok(self.classes.read().map_err(|_| poisoned())?.clone())
    }

    async fn create_unit(&self, unit: Unit) -> StoreResult<Unit> {
        let mut units = self.units.write().map_err(|_| poisoned())?;
        if units.iter().any(|u| u.symbol.eq_ignore_ascii_case(&unit.symbol)) {
            return Err(StoreError::Conflict(format!("unit symbol `{}` already exists", unit.symbol)));
        }
        units.push(unit.clone());
        Ok(unit)
    }

    async fn create_class(&self, class: ItemClass) -> StoreResult<ItemClass> {
        let mut classes = self.classes.write().map_err(|_| poisoned())?;
        if classes.iter().any(|c| c.name.eq_ignore_ascii_case(&class.name)) {
            return Err(StoreError::Conflict(format!("class `{}` already exists", class.name)));
        }
        classes.push(class.clone());
        Ok(class)
    }

    async fn delete_unit(&self, id: UnitId) -> StoreResult<bool> {
        let mut units = self.units.write().map_err(|_| poisoned())?;
        let before = units.len();
        units.retain(|u| !u.is(&id));
        Ok(units.len() != before)
    }

    async fn delete_class(&self, id: ClassId) -> StoreResult<bool> {
        let mut classes = self.classes.write().map_err(|_| poisoned())?;
        let before = classes.len();
        classes.retain(|c| !c.is(&id));
        Ok(classes.len() != before)
    }
}
