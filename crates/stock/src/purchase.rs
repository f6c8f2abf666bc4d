use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockyard_core::{ClassId, DomainError, DomainResult, Entity, PurchaseItemId, UnitId};

/// A purchased good tracked for stock ("achat").
///
/// Immutable value: updates go through [`PurchaseItemPatch::apply`], which
/// returns a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: PurchaseItemId,
    pub acquired_on: NaiveDate,
    pub designation: String,
    /// Quantity purchased, in the item's unit.
    pub quantity: i64,
    /// Unit price in smallest currency unit.
    pub unit_price: i64,
    /// Total cost in smallest currency unit.
    pub total_cost: i64,
    pub unit_id: UnitId,
    pub class_id: ClassId,
}

impl Entity for PurchaseItem {
    type Id = PurchaseItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a purchase item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseItem {
    pub acquired_on: NaiveDate,
    pub designation: String,
    pub quantity: i64,
    pub unit_price: i64,
    /// Defaults to `quantity * unit_price` when absent.
    pub total_cost: Option<i64>,
    pub unit_id: UnitId,
    pub class_id: ClassId,
}

impl NewPurchaseItem {
    /// Validate and materialize the record under the given id.
    pub fn into_item(self, id: PurchaseItemId) -> DomainResult<PurchaseItem> {
        let designation = self.designation.trim().to_string();
        if designation.is_empty() {
            return Err(DomainError::validation("designation cannot be empty"));
        }
        ensure_non_negative("quantity", self.quantity)?;
        ensure_non_negative("unit_price", self.unit_price)?;

        let total_cost = match self.total_cost {
            Some(total) => {
                ensure_non_negative("total_cost", total)?;
                total
            }
            None => self
                .quantity
                .checked_mul(self.unit_price)
                .ok_or_else(|| DomainError::invariant("total cost overflows"))?,
        };

        Ok(PurchaseItem {
            id,
            acquired_on: self.acquired_on,
            designation,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_cost,
            unit_id: self.unit_id,
            class_id: self.class_id,
        })
    }
}

/// Partial update of a purchase item. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItemPatch {
    pub acquired_on: Option<NaiveDate>,
    pub designation: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
    pub total_cost: Option<i64>,
    pub unit_id: Option<UnitId>,
    pub class_id: Option<ClassId>,
}

impl PurchaseItemPatch {
    /// Return the patched copy of `item`. The original is untouched.
    pub fn apply(&self, item: &PurchaseItem) -> DomainResult<PurchaseItem> {
        let designation = match &self.designation {
            Some(d) if d.trim().is_empty() => {
                return Err(DomainError::validation("designation cannot be empty"));
            }
            Some(d) => d.trim().to_string(),
            None => item.designation.clone(),
        };

        let quantity = self.quantity.unwrap_or(item.quantity);
        let unit_price = self.unit_price.unwrap_or(item.unit_price);
        let total_cost = self.total_cost.unwrap_or(item.total_cost);
        ensure_non_negative("quantity", quantity)?;
        ensure_non_negative("unit_price", unit_price)?;
        ensure_non_negative("total_cost", total_cost)?;

        Ok(PurchaseItem {
            id: item.id,
            acquired_on: self.acquired_on.unwrap_or(item.acquired_on),
            designation,
            quantity,
            unit_price,
            total_cost,
            unit_id: self.unit_id.unwrap_or(item.unit_id),
            class_id: self.class_id.unwrap_or(item.class_id),
        })
    }
}

fn ensure_non_negative(field: &str, value: i64) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item() -> NewPurchaseItem {
        NewPurchaseItem {
            acquired_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            designation: "  Cement bag ".to_string(),
            quantity: 40,
            unit_price: 1_250,
            total_cost: None,
            unit_id: UnitId::new(),
            class_id: ClassId::new(),
        }
    }

    #[test]
    fn total_cost_defaults_to_quantity_times_price() {
        let item = new_item().into_item(PurchaseItemId::new()).unwrap();
        assert_eq!(item.total_cost, 50_000);
        assert_eq!(item.designation, "Cement bag");
    }

    #[test]
    fn blank_designation_is_rejected() {
        let mut input = new_item();
        input.designation = "   ".to_string();
        let err = input.into_item(PurchaseItemId::new()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut input = new_item();
        input.quantity = -1;
        assert!(input.into_item(PurchaseItemId::new()).is_err());
    }

    #[test]
    fn patch_returns_new_value_and_keeps_original() {
        let item = new_item().into_item(PurchaseItemId::new()).unwrap();
        let patch = PurchaseItemPatch {
            designation: Some("Cement bag 50kg".to_string()),
            quantity: Some(60),
            ..Default::default()
        };

        let patched = patch.apply(&item).unwrap();
        assert_eq!(patched.id, item.id);
        assert_eq!(patched.designation, "Cement bag 50kg");
        assert_eq!(patched.quantity, 60);
        assert_eq!(item.designation, "Cement bag");
        assert_eq!(item.quantity, 40);
    }
}
