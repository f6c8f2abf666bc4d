//! Stock application service: purchase items, movements, reference data and
//! the aggregated stock views built on top of them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockyard_core::{ClassId, MovementId, PurchaseItemId, UnitId};
use stockyard_stock::{
    Direction, ItemClass, MovementPatch, NewItemClass, NewPurchaseItem, NewStockMovement, NewUnit,
    PurchaseItem, PurchaseItemPatch, StockAggregator, StockDetails, StockMovement, StockSummary,
    Unit, orphaned_movements, shortages,
};

use crate::error::ServiceError;
use crate::repository::{PurchaseItemRepository, ReferenceRepository, StockMovementRepository};

/// What a cascading purchase delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub movements_in: u64,
    pub movements_out: u64,
}

#[derive(Clone)]
pub struct StockService {
    purchases: Arc<dyn PurchaseItemRepository>,
    received: Arc<dyn StockMovementRepository>,
    issued: Arc<dyn StockMovementRepository>,
    references: Arc<dyn ReferenceRepository>,
}

impl std::fmt::Debug for StockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockService").finish_non_exhaustive()
    }
}

impl StockService {
    /// `received` must hold `in` movements and `issued` the `out` ones.
    pub fn new(
        purchases: Arc<dyn PurchaseItemRepository>,
        received: Arc<dyn StockMovementRepository>,
        issued: Arc<dyn StockMovementRepository>,
        references: Arc<dyn ReferenceRepository>,
    ) -> Result<Self, ServiceError> {
        if received.direction() != Direction::In || issued.direction() != Direction::Out {
            return Err(ServiceError::InvariantViolation(
                "movement repositories are wired to the wrong directions".to_string(),
            ));
        }
        Ok(Self {
            purchases,
            received,
            issued,
            references,
        })
    }

    fn movements(&self, direction: Direction) -> &Arc<dyn StockMovementRepository> {
        match direction {
            Direction::In => &self.received,
            Direction::Out => &self.issued,
        }
    }

    // ---------------------------------------------------------------------
    // Stock views
    // ---------------------------------------------------------------------

    /// One summary per purchase item, in purchase insertion order.
    #[instrument(skip(self), err)]
    pub async fn summaries(&self) -> Result<Vec<StockSummary>, ServiceError> {
        let items = self.purchases.find_all().await?;
        let received = self.received.find_all().await?;
        let issued = self.issued.find_all().await?;
        let catalog = self.references.catalog().await?;

        let orphans = orphaned_movements(&items, received.iter().chain(issued.iter()));
        if !orphans.is_empty() {
            tracing::warn!(
                count = orphans.len(),
                "movements reference unknown purchase items and are left out of stock views"
            );
        }

        Ok(StockAggregator::new(&catalog).summarize_all(&items, &received, &issued))
    }

    /// Summaries whose available quantity went negative.
    pub async fn shortages(&self) -> Result<Vec<StockSummary>, ServiceError> {
        let all = self.summaries().await?;
        Ok(shortages(&all).into_iter().cloned().collect())
    }

    #[instrument(skip(self), fields(purchase_item_id = %id), err)]
    pub async fn summary(&self, id: PurchaseItemId) -> Result<Option<StockSummary>, ServiceError> {
        Ok(self.details(id).await?.map(|d| d.summary))
    }

    #[instrument(skip(self), fields(purchase_item_id = %id), err)]
    pub async fn details(&self, id: PurchaseItemId) -> Result<Option<StockDetails>, ServiceError> {
        let Some(item) = self.purchases.find_by_id(id).await? else {
            return Ok(None);
        };
        let received = self.received.find_by_purchase(id).await?;
        let issued = self.issued.find_by_purchase(id).await?;
        let catalog = self.references.catalog().await?;

        Ok(Some(StockAggregator::new(&catalog).detail(&item, &received, &issued)))
    }

    // ---------------------------------------------------------------------
    // Purchase items
    // ---------------------------------------------------------------------

    pub async fn list_purchases(&self) -> Result<Vec<PurchaseItem>, ServiceError> {
        Ok(self.purchases.find_all().await?)
    }

    pub async fn purchase(&self, id: PurchaseItemId) -> Result<PurchaseItem, ServiceError> {
        self.purchases.find_by_id(id).await?.ok_or(ServiceError::NotFound)
    }

    #[instrument(skip(self, input), err)]
    pub async fn create_purchase(&self, input: NewPurchaseItem) -> Result<PurchaseItem, ServiceError> {
        self.ensure_references(input.unit_id, input.class_id).await?;
        let item = input.into_item(PurchaseItemId::new())?;
        let item = self.purchases.create(item).await?;
        tracing::info!(purchase_item_id = %item.id, designation = %item.designation, "purchase item created");
        Ok(item)
    }

    #[instrument(skip(self, patch), fields(purchase_item_id = %id), err)]
    pub async fn update_purchase(
        &self,
        id: PurchaseItemId,
        patch: PurchaseItemPatch,
    ) -> Result<PurchaseItem, ServiceError> {
        let current = self.purchase(id).await?;
        let updated = patch.apply(&current)?;
        if updated.unit_id != current.unit_id || updated.class_id != current.class_id {
            self.ensure_references(updated.unit_id, updated.class_id).await?;
        }
        Ok(self.purchases.update(updated).await?)
    }

    /// Delete a purchase item and every movement that references it.
    #[instrument(skip(self), fields(purchase_item_id = %id), err)]
    pub async fn delete_purchase(&self, id: PurchaseItemId) -> Result<CascadeReport, ServiceError> {
        if self.purchases.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }

        let report = CascadeReport {
            movements_in: self.received.delete_by_purchase(id).await?,
            movements_out: self.issued.delete_by_purchase(id).await?,
        };
        if !self.purchases.delete(id).await? {
            return Err(ServiceError::NotFound);
        }

        tracing::info!(
            purchase_item_id = %id,
            movements_in = report.movements_in,
            movements_out = report.movements_out,
            "purchase item deleted"
        );
        Ok(report)
    }

    async fn ensure_references(&self, unit_id: UnitId, class_id: ClassId) -> Result<(), ServiceError> {
        let catalog = self.references.catalog().await?;
        if catalog.unit(unit_id).is_none() {
            return Err(ServiceError::Validation(format!("unknown unit {unit_id}")));
        }
        if catalog.class(class_id).is_none() {
            return Err(ServiceError::Validation(format!("unknown class {class_id}")));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Movements
    // ---------------------------------------------------------------------

    pub async fn list_movements(&self, direction: Direction) -> Result<Vec<StockMovement>, ServiceError> {
        Ok(self.movements(direction).find_all().await?)
    }

    pub async fn movement(&self, direction: Direction, id: MovementId) -> Result<StockMovement, ServiceError> {
        self.movements(direction)
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Record a receipt or an issuance against an existing purchase item.
    ///
    /// Issuing more than was received is accepted; the resulting negative
    /// balance shows up in [`StockService::shortages`].
    #[instrument(skip(self, input), fields(direction = %direction, purchase_item_id = %input.purchase_item_id), err)]
    pub async fn record_movement(
        &self,
        direction: Direction,
        input: NewStockMovement,
    ) -> Result<StockMovement, ServiceError> {
        if self.purchases.find_by_id(input.purchase_item_id).await?.is_none() {
            return Err(ServiceError::Validation(format!(
                "unknown purchase item {}",
                input.purchase_item_id
            )));
        }

        let movement = input.into_movement(MovementId::new(), direction, 0)?;
        let movement = self.movements(direction).create(movement).await?;
        tracing::info!(
            movement_id = %movement.id,
            quantity = movement.quantity,
            date = %movement.date,
            "stock movement recorded"
        );
        Ok(movement)
    }

    #[instrument(skip(self, patch), fields(direction = %direction, movement_id = %id), err)]
    pub async fn update_movement(
        &self,
        direction: Direction,
        id: MovementId,
        patch: MovementPatch,
    ) -> Result<StockMovement, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::Validation("nothing to update".to_string()));
        }
        let current = self.movement(direction, id).await?;
        let updated = patch.apply(&current)?;
        Ok(self.movements(direction).update(updated).await?)
    }

    pub async fn delete_movement(&self, direction: Direction, id: MovementId) -> Result<(), ServiceError> {
        if self.movements(direction).delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    /// Remove every movement of one direction. Returns how many were removed.
    #[instrument(skip(self), fields(direction = %direction), err)]
    pub async fn delete_all_movements(&self, direction: Direction) -> Result<u64, ServiceError> {
        let removed = self.movements(direction).delete_all().await?;
        tracing::warn!(removed, "all movements deleted");
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // Reference data
    // ---------------------------------------------------------------------

    pub async fn units(&self) -> Result<Vec<Unit>, ServiceError> {
        Ok(self.references.list_units().await?)
    }

    pub async fn classes(&self) -> Result<Vec<ItemClass>, ServiceError> {
        Ok(self.references.list_classes().await?)
    }

    pub async fn create_unit(&self, input: NewUnit) -> Result<Unit, ServiceError> {
        let unit = input.into_unit(UnitId::new())?;
        Ok(self.references.create_unit(unit).await?)
    }

    pub async fn create_class(&self, input: NewItemClass) -> Result<ItemClass, ServiceError> {
        let class = input.into_class(ClassId::new())?;
        Ok(self.references.create_class(class).await?)
    }

    /// Refused while a purchase item still uses the unit.
    pub async fn delete_unit(&self, id: UnitId) -> Result<(), ServiceError> {
        let items = self.purchases.find_all().await?;
        if items.iter().any(|i| i.unit_id == id) {
            return Err(ServiceError::Conflict(format!("unit {id} is used by purchase items")));
        }
        match self.references.delete_unit(id).await? {
            true => Ok(()),
            false => Err(ServiceError::NotFound),
        }
    }

    /// Refused while a purchase item still uses the class.
    pub async fn delete_class(&self, id: ClassId) -> Result<(), ServiceError> {
        let items = self.purchases.find_all().await?;
        if items.iter().any(|i| i.class_id == id) {
            return Err(ServiceError::Conflict(format!("class {id} is used by purchase items")));
        }
        match self.references.delete_class(id).await? {
            true => Ok(()),
            false => Err(ServiceError::NotFound),
        }
    }
}

