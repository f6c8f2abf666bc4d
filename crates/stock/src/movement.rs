use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockyard_core::{Chronological, DomainError, DomainResult, Entity, MovementId, PurchaseItemId};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Receipt into a store or work-site ("entrée").
    In,
    /// Issuance out of stock ("sortie").
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(DomainError::validation(format!(
                "direction must be `in` or `out`, got `{other}`"
            ))),
        }
    }
}

/// One stock movement record (immutable).
///
/// `source` / `destination` are free-form descriptors: a store code, a
/// work-site code or a supplier name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub direction: Direction,
    pub purchase_item_id: PurchaseItemId,
    pub date: NaiveDate,
    pub quantity: i64,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub observation: Option<String>,
    /// Insertion position assigned by the store.
    pub sequence: u64,
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Chronological for StockMovement {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Input for recording a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockMovement {
    pub purchase_item_id: PurchaseItemId,
    pub date: NaiveDate,
    pub quantity: i64,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub observation: Option<String>,
}

impl NewStockMovement {
    /// Validate and materialize the record.
    pub fn into_movement(
        self,
        id: MovementId,
        direction: Direction,
        sequence: u64,
    ) -> DomainResult<StockMovement> {
        ensure_quantity(self.quantity)?;
        Ok(StockMovement {
            id,
            direction,
            purchase_item_id: self.purchase_item_id,
            date: self.date,
            quantity: self.quantity,
            source: normalize(self.source),
            destination: normalize(self.destination),
            observation: normalize(self.observation),
            sequence,
        })
    }
}

/// Narrow update of a movement: date, quantity, observation, destination.
///
/// A blank string clears an optional text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPatch {
    pub date: Option<NaiveDate>,
    pub quantity: Option<i64>,
    pub observation: Option<String>,
    pub destination: Option<String>,
}

impl MovementPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.quantity.is_none()
            && self.observation.is_none()
            && self.destination.is_none()
    }

    /// Return the patched copy of `movement`. Identity, direction, purchase
    /// link and insertion sequence are preserved.
    pub fn apply(&self, movement: &StockMovement) -> DomainResult<StockMovement> {
        let quantity = self.quantity.unwrap_or(movement.quantity);
        ensure_quantity(quantity)?;

        Ok(StockMovement {
            date: self.date.unwrap_or(movement.date),
            quantity,
            observation: match &self.observation {
                Some(o) => normalize(Some(o.clone())),
                None => movement.observation.clone(),
            },
            destination: match &self.destination {
                Some(d) => normalize(Some(d.clone())),
                None => movement.destination.clone(),
            },
            ..movement.clone()
        })
    }
}

/// Trimmed, non-blank view of a descriptor.
pub(crate) fn descriptor(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn normalize(value: Option<String>) -> Option<String> {
    descriptor(value.as_deref()).map(str::to_string)
}

fn ensure_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(quantity: i64) -> NewStockMovement {
        NewStockMovement {
            purchase_item_id: PurchaseItemId::new(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            quantity,
            source: Some("  Depot A ".to_string()),
            destination: Some("".to_string()),
            observation: None,
        }
    }

    #[test]
    fn descriptors_are_trimmed_and_blanks_dropped() {
        let m = input(5).into_movement(MovementId::new(), Direction::In, 1).unwrap();
        assert_eq!(m.source.as_deref(), Some("Depot A"));
        assert_eq!(m.destination, None);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = input(-3).into_movement(MovementId::new(), Direction::Out, 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn patch_only_touches_narrow_fields() {
        let m = input(5).into_movement(MovementId::new(), Direction::In, 7).unwrap();
        let patch = MovementPatch {
            quantity: Some(12),
            observation: Some("recount".to_string()),
            ..Default::default()
        };

        let patched = patch.apply(&m).unwrap();
        assert_eq!(patched.quantity, 12);
        assert_eq!(patched.observation.as_deref(), Some("recount"));
        assert_eq!(patched.id, m.id);
        assert_eq!(patched.sequence, 7);
        assert_eq!(patched.source, m.source);
        assert_eq!(m.quantity, 5);
    }

    #[test]
    fn blank_patch_value_clears_field() {
        let mut m = input(5).into_movement(MovementId::new(), Direction::Out, 1).unwrap();
        m.observation = Some("broken pallet".to_string());
        let patched = MovementPatch {
            observation: Some("  ".to_string()),
            ..Default::default()
        }
        .apply(&m)
        .unwrap();
        assert_eq!(patched.observation, None);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("IN".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!("out".parse::<Direction>().unwrap(), Direction::Out);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
