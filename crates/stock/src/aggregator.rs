//! Stock aggregation: movement history -> stock figures.
//!
//! All functions here are pure. Totals do not depend on the order of the
//! input; the detailed ledger keeps the input order one line per record.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockyard_core::{MovementId, PurchaseItemId};

use crate::movement::{StockMovement, descriptor};
use crate::purchase::PurchaseItem;
use crate::reference::{ItemLabels, LabelSource};

/// Stock figures of one purchase item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub purchase_item_id: PurchaseItemId,
    pub designation: String,
    pub unit: String,
    pub class: String,
    pub total_received: i64,
    pub total_issued: i64,
    /// `total_received - total_issued`; negative when over-issued.
    pub available: i64,
    /// Distinct sources of received stock, sorted.
    pub sources: Vec<String>,
    /// Distinct destinations of issued stock, sorted.
    pub destinations: Vec<String>,
}

/// One line of the detailed movement ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLine {
    pub id: MovementId,
    pub date: NaiveDate,
    pub quantity: i64,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub observation: Option<String>,
}

impl From<&StockMovement> for MovementLine {
    fn from(m: &StockMovement) -> Self {
        Self {
            id: m.id,
            date: m.date,
            quantity: m.quantity,
            source: m.source.clone(),
            destination: m.destination.clone(),
            observation: m.observation.clone(),
        }
    }
}

/// Summary plus the full per-movement ledger of both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDetails {
    #[serde(flatten)]
    pub summary: StockSummary,
    pub received: Vec<MovementLine>,
    pub issued: Vec<MovementLine>,
}

/// Computes stock views, labelling them through a [`LabelSource`].
#[derive(Debug)]
pub struct StockAggregator<'a, L: LabelSource> {
    labels: &'a L,
}

impl<'a, L: LabelSource> StockAggregator<'a, L> {
    pub fn new(labels: &'a L) -> Self {
        Self { labels }
    }

    /// Totals, distinct sources/destinations and labels of one item.
    ///
    /// Movements linked to another purchase item are ignored.
    pub fn summarize(
        &self,
        item: &PurchaseItem,
        received: &[StockMovement],
        issued: &[StockMovement],
    ) -> StockSummary {
        self.build_summary(item, received, issued)
    }

    /// Summary plus the per-movement ledger, in input order.
    pub fn detail(
        &self,
        item: &PurchaseItem,
        received: &[StockMovement],
        issued: &[StockMovement],
    ) -> StockDetails {
        let lines = |movements: &[StockMovement]| -> Vec<MovementLine> {
            movements
                .iter()
                .filter(|m| m.purchase_item_id == item.id)
                .map(MovementLine::from)
                .collect()
        };

        StockDetails {
            summary: self.build_summary(item, received, issued),
            received: lines(received),
            issued: lines(issued),
        }
    }

    /// One summary per purchase item, in the order of `items`.
    ///
    /// Items without movements get zero totals; every summary is labelled.
    pub fn summarize_all(
        &self,
        items: &[PurchaseItem],
        received: &[StockMovement],
        issued: &[StockMovement],
    ) -> Vec<StockSummary> {
        let mut groups: HashMap<PurchaseItemId, (Vec<&StockMovement>, Vec<&StockMovement>)> =
            HashMap::with_capacity(items.len());
        for m in received {
            groups.entry(m.purchase_item_id).or_default().0.push(m);
        }
        for m in issued {
            groups.entry(m.purchase_item_id).or_default().1.push(m);
        }

        items
            .iter()
            .map(|item| match groups.get(&item.id) {
                Some((ins, outs)) => {
                    self.build_summary(item, ins.iter().copied(), outs.iter().copied())
                }
                None => self.build_summary(item, std::iter::empty(), std::iter::empty()),
            })
            .collect()
    }

    fn build_summary<'m>(
        &self,
        item: &PurchaseItem,
        received: impl IntoIterator<Item = &'m StockMovement>,
        issued: impl IntoIterator<Item = &'m StockMovement>,
    ) -> StockSummary {
        let labels = ItemLabels::resolve(item, self.labels);

        let mut total_received: i64 = 0;
        let mut sources = BTreeSet::new();
        for m in received.into_iter().filter(|m| m.purchase_item_id == item.id) {
            total_received = total_received.saturating_add(m.quantity);
            if let Some(s) = descriptor(m.source.as_deref()) {
                sources.insert(s.to_string());
            }
        }

        let mut total_issued: i64 = 0;
        let mut destinations = BTreeSet::new();
        for m in issued.into_iter().filter(|m| m.purchase_item_id == item.id) {
            total_issued = total_issued.saturating_add(m.quantity);
            if let Some(d) = descriptor(m.destination.as_deref()) {
                destinations.insert(d.to_string());
            }
        }

        StockSummary {
            purchase_item_id: item.id,
            designation: labels.designation,
            unit: labels.unit,
            class: labels.class,
            total_received,
            total_issued,
            available: total_received.saturating_sub(total_issued),
            sources: sources.into_iter().collect(),
            destinations: destinations.into_iter().collect(),
        }
    }
}

/// Summaries whose available balance is negative (more issued than received).
pub fn shortages(summaries: &[StockSummary]) -> Vec<&StockSummary> {
    summaries.iter().filter(|s| s.available < 0).collect()
}

/// Movements that reference no known purchase item.
pub fn orphaned_movements<'m>(
    items: &[PurchaseItem],
    movements: impl IntoIterator<Item = &'m StockMovement>,
) -> Vec<&'m StockMovement> {
    let known: HashSet<PurchaseItemId> = items.iter().map(|i| i.id).collect();
    movements
        .into_iter()
        .filter(|m| !known.contains(&m.purchase_item_id))
        .collect()
}
