//! Transfer and archival planning
//!
//! Pure planning cores for the scheduled stage transitions: merge-add upsert
//! planning for surplus/today moves, consolidation of expired rows into one
//! spoilage group per `(item_id, batch_date)`, and selection of depleted
//! batches eligible for archival.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{classify_stock_status, Collection, StockStatus};

/// How a batch should land in the target collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransferAction {
    /// No row with the same `(item_id, batch_date)` exists: insert, with the
    /// status recomputed from the transferred quantity.
    Insert { status: StockStatus },
    /// A row already exists: add the incoming quantity to it.
    MergeAdd { merged_quantity: Decimal },
}

/// Decide how a source batch lands in the target collection.
pub fn plan_transfer(
    incoming_quantity: Decimal,
    existing_quantity: Option<Decimal>,
    threshold: Decimal,
) -> TransferAction {
    match existing_quantity {
        Some(existing) => TransferAction::MergeAdd {
            merged_quantity: existing + incoming_quantity,
        },
        None => TransferAction::Insert {
            status: classify_stock_status(incoming_quantity, threshold),
        },
    }
}

/// An expired batch row found in one of the active collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiredRow {
    pub collection: Collection,
    pub item_id: i64,
    pub item_name: String,
    pub category: Option<String>,
    pub batch_date: NaiveDate,
    pub quantity: Decimal,
    pub expiration_date: NaiveDate,
}

/// One consolidated spoilage insert, plus the source rows it absorbs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoilageGroup {
    pub item_id: i64,
    pub item_name: String,
    pub category: Option<String>,
    pub batch_date: NaiveDate,
    pub quantity_spoiled: Decimal,
    pub expiration_date: NaiveDate,
    /// Collections contributing to this group, in scan order
    pub sources: Vec<Collection>,
}

/// Group expired rows by `(item_id, batch_date)` across collections, summing
/// quantities into one spoilage group per key. Groups come back ordered by
/// `(item_id, batch_date)` so runs are deterministic.
pub fn consolidate_expired(rows: Vec<ExpiredRow>) -> Vec<SpoilageGroup> {
    let mut groups: Vec<SpoilageGroup> = Vec::new();

    for row in rows {
        match groups
            .iter_mut()
            .find(|g| g.item_id == row.item_id && g.batch_date == row.batch_date)
        {
            Some(group) => {
                group.quantity_spoiled += row.quantity;
                group.expiration_date = group.expiration_date.min(row.expiration_date);
                group.sources.push(row.collection);
            }
            None => groups.push(SpoilageGroup {
                item_id: row.item_id,
                item_name: row.item_name,
                category: row.category,
                batch_date: row.batch_date,
                quantity_spoiled: row.quantity,
                expiration_date: row.expiration_date,
                sources: vec![row.collection],
            }),
        }
    }

    groups.sort_by_key(|g| (g.item_id, g.batch_date));
    groups
}

/// Recompute a consolidation group from the quantities its source rows hold
/// now. Between the expiry scan and the consolidating write, transfers or
/// deductions may have changed the rows: sources that disappeared drop out,
/// and the spoiled quantity is rebuilt from the live values. Returns `None`
/// when nothing is left to spoil.
pub fn refresh_spoilage_group(
    group: &SpoilageGroup,
    live: &[(Collection, Decimal)],
) -> Option<SpoilageGroup> {
    if live.is_empty() {
        return None;
    }
    let mut refreshed = group.clone();
    refreshed.quantity_spoiled = live.iter().map(|(_, quantity)| *quantity).sum();
    refreshed.sources = live.iter().map(|(collection, _)| *collection).collect();
    Some(refreshed)
}

/// Pick the batches of one item eligible for auto-archival.
///
/// A depleted batch (quantity zero) may be archived only while at least one
/// other batch of the same item in the same collection still holds stock, so
/// an item is never silently lost from current-inventory views. Returns
/// indices into the input slice.
pub fn select_archivable(quantities: &[Decimal]) -> Vec<usize> {
    let any_stocked = quantities.iter().any(|q| *q > Decimal::ZERO);
    if !any_stocked {
        return Vec::new();
    }
    quantities
        .iter()
        .enumerate()
        .filter(|(_, q)| q.is_zero())
        .map(|(i, _)| i)
        .collect()
}
