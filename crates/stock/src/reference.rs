//! Reference data joined into stock views: units of measure and item classes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockyard_core::{ClassId, DomainError, DomainResult, Entity, UnitId};

use crate::purchase::PurchaseItem;

/// Unit of measure ("unité"), e.g. `Bag` / `bg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub symbol: String,
}

impl Entity for Unit {
    type Id = UnitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Item class / category ("classe").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemClass {
    pub id: ClassId,
    pub name: String,
}

impl Entity for ItemClass {
    type Id = ClassId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUnit {
    pub name: String,
    pub symbol: String,
}

impl NewUnit {
    pub fn into_unit(self, id: UnitId) -> DomainResult<Unit> {
        let name = required("name", &self.name)?;
        let symbol = required("symbol", &self.symbol)?;
        Ok(Unit { id, name, symbol })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItemClass {
    pub name: String,
}

impl NewItemClass {
    pub fn into_class(self, id: ClassId) -> DomainResult<ItemClass> {
        let name = required("name", &self.name)?;
        Ok(ItemClass { id, name })
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(v.to_string())
}

/// Resolves display labels for the references carried by a purchase item.
pub trait LabelSource {
    fn unit_symbol(&self, id: UnitId) -> Option<&str>;
    fn class_name(&self, id: ClassId) -> Option<&str>;
}

impl<L: LabelSource + ?Sized> LabelSource for &L {
    fn unit_symbol(&self, id: UnitId) -> Option<&str> {
        (**self).unit_symbol(id)
    }

    fn class_name(&self, id: ClassId) -> Option<&str> {
        (**self).class_name(id)
    }
}

/// In-memory snapshot of units and classes.
///
/// Built either from the reference tables or from pre-joined rows
/// (see [`ReferenceCatalog::with_unit`] / [`ReferenceCatalog::with_class`]).
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    units: HashMap<UnitId, Unit>,
    classes: HashMap<ClassId, ItemClass>,
}

impl ReferenceCatalog {
    pub fn new(
        units: impl IntoIterator<Item = Unit>,
        classes: impl IntoIterator<Item = ItemClass>,
    ) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.id, u)).collect(),
            classes: classes.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.units.insert(unit.id, unit);
        self
    }

    pub fn with_class(mut self, class: ItemClass) -> Self {
        self.classes.insert(class.id, class);
        self
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn class(&self, id: ClassId) -> Option<&ItemClass> {
        self.classes.get(&id)
    }
}

impl LabelSource for ReferenceCatalog {
    fn unit_symbol(&self, id: UnitId) -> Option<&str> {
        self.units.get(&id).map(|u| u.symbol.as_str())
    }

    fn class_name(&self, id: ClassId) -> Option<&str> {
        self.classes.get(&id).map(|c| c.name.as_str())
    }
}

/// Display labels of one purchase item. Never blank: an unresolved reference
/// falls back to its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLabels {
    pub designation: String,
    pub unit: String,
    pub class: String,
}

impl ItemLabels {
    pub fn resolve(item: &PurchaseItem, source: &impl LabelSource) -> Self {
        let unit = source
            .unit_symbol(item.unit_id)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| item.unit_id.to_string());
        let class = source
            .class_name(item.class_id)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| item.class_id.to_string());
        let designation = if item.designation.trim().is_empty() {
            item.id.to_string()
        } else {
            item.designation.clone()
        };

        Self {
            designation,
            unit,
            class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockyard_core::PurchaseItemId;

    fn item(unit_id: UnitId, class_id: ClassId) -> PurchaseItem {
        PurchaseItem {
            id: PurchaseItemId::new(),
            acquired_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            designation: "Rebar 12mm".to_string(),
            quantity: 10,
            unit_price: 900,
            total_cost: 9_000,
            unit_id,
            class_id,
        }
    }

    #[test]
    fn labels_come_from_catalog() {
        let unit = NewUnit { name: "Bar".into(), symbol: "bar".into() }
            .into_unit(UnitId::new())
            .unwrap();
        let class = NewItemClass { name: "Steel".into() }
            .into_class(ClassId::new())
            .unwrap();
        let catalog = ReferenceCatalog::default()
            .with_unit(unit.clone())
            .with_class(class.clone());

        let labels = ItemLabels::resolve(&item(unit.id, class.id), &catalog);
        assert_eq!(labels.designation, "Rebar 12mm");
        assert_eq!(labels.unit, "bar");
        assert_eq!(labels.class, "Steel");
    }

    #[test]
    fn unresolved_references_fall_back_to_ids() {
        let (unit_id, class_id) = (UnitId::new(), ClassId::new());
        let labels = ItemLabels::resolve(&item(unit_id, class_id), &ReferenceCatalog::default());
        assert_eq!(labels.unit, unit_id.to_string());
        assert_eq!(labels.class, class_id.to_string());
    }

    #[test]
    fn unit_requires_symbol() {
        let err = NewUnit { name: "Bag".into(), symbol: " ".into() }
            .into_unit(UnitId::new())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
