//! Aggregate status engine
//!
//! Recomputes the stock status of an item from the sum of all its batches in
//! one collection and writes that single status to every batch row, so the
//! invariant "all batches of one item in one collection carry the same
//! status" holds after any mutation. Optionally auto-archives depleted
//! batches afterwards; archival is best-effort and never rolls back the
//! status write.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use shared::{classify_stock_status, select_archivable, Collection, StockStatus};

use crate::error::{AppError, AppResult};
use crate::services::store::{Batch, BatchStore};
use crate::services::threshold::ThresholdResolver;

/// Reason written to the archived shadow rows
const ARCHIVE_REASON: &str = "Depleted batch superseded by newer stock";

/// Aggregate view of one item within a collection
#[derive(Debug, Clone, Serialize)]
pub struct AggregateStatusReport {
    pub item_name: String,
    pub aggregate_status: StockStatus,
    pub total_stock: Decimal,
    pub batch_count: usize,
    pub batches: Vec<Batch>,
}

/// Per-item outcome of a bulk recalculation
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecalcResult {
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_status: Option<StockStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate status engine
#[derive(Clone)]
pub struct AggregateStatusService {
    store: BatchStore,
    thresholds: Arc<ThresholdResolver>,
}

impl AggregateStatusService {
    pub fn new(store: BatchStore, thresholds: Arc<ThresholdResolver>) -> Self {
        Self { store, thresholds }
    }

    /// Read-only aggregate view: per-batch detail plus the classified sum.
    /// Does not write anything.
    pub async fn query(
        &self,
        collection: Collection,
        item_name: &str,
    ) -> AppResult<AggregateStatusReport> {
        let batches = self.store.fetch_batches(collection, item_name).await?;
        if batches.is_empty() {
            return Err(AppError::NotFound(format!("Item '{}'", item_name)));
        }
        let threshold = self.thresholds.threshold_for(item_name).await;
        Ok(build_report(item_name, batches, threshold))
    }

    /// Recompute the aggregate status and write it to every batch of the
    /// item, then auto-archive depleted batches (best-effort).
    pub async fn recalculate(
        &self,
        collection: Collection,
        item_name: &str,
    ) -> AppResult<AggregateStatusReport> {
        let batches = self.store.fetch_batches(collection, item_name).await?;
        if batches.is_empty() {
            return Err(AppError::NotFound(format!("Item '{}'", item_name)));
        }

        let threshold = self.thresholds.threshold_for(item_name).await;
        let total: Decimal = batches.iter().map(|b| b.stock_quantity).sum();
        let status = classify_stock_status(total, threshold);

        self.store
            .update_item_status(collection, item_name, status)
            .await?;

        self.auto_archive(collection, item_name, &batches).await;

        // Re-read so the report reflects archival
        let batches = self.store.fetch_batches(collection, item_name).await?;
        Ok(build_report(item_name, batches, threshold))
    }

    /// Re-run the roll-up for every distinct item in a collection, collecting
    /// per-item failures without aborting the sweep.
    pub async fn recalculate_all(&self, collection: Collection) -> AppResult<Vec<ItemRecalcResult>> {
        let names = self.store.distinct_item_names(collection).await?;
        let mut results = Vec::with_capacity(names.len());

        for name in names {
            match self.recalculate(collection, &name).await {
                Ok(report) => results.push(ItemRecalcResult {
                    item_name: name,
                    aggregate_status: Some(report.aggregate_status),
                    error: None,
                }),
                Err(e) => {
                    tracing::error!(item_name = %name, error = %e, "aggregate recalculation failed");
                    results.push(ItemRecalcResult {
                        item_name: name,
                        aggregate_status: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(results)
    }

    /// Move depleted batches to the archived shadow, never touching the last
    /// remaining batch of the item. Failures are logged and swallowed.
    async fn auto_archive(&self, collection: Collection, item_name: &str, batches: &[Batch]) {
        let quantities: Vec<Decimal> = batches.iter().map(|b| b.stock_quantity).collect();
        let archivable = select_archivable(&quantities);
        if archivable.is_empty() {
            return;
        }

        let ids: Vec<i64> = archivable.iter().map(|&i| batches[i].id).collect();
        match self.store.archive_batches(collection, &ids, ARCHIVE_REASON).await {
            Ok(count) if count > 0 => {
                tracing::info!(
                    item_name = %item_name,
                    collection = %collection.as_str(),
                    archived = count,
                    "auto-archived depleted batches"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    item_name = %item_name,
                    collection = %collection.as_str(),
                    error = %e,
                    "auto-archive failed; status update kept"
                );
            }
        }
    }
}

fn build_report(item_name: &str, batches: Vec<Batch>, threshold: Decimal) -> AggregateStatusReport {
    let total: Decimal = batches.iter().map(|b| b.stock_quantity).sum();
    AggregateStatusReport {
        item_name: item_name.to_string(),
        aggregate_status: classify_stock_status(total, threshold),
        total_stock: total,
        batch_count: batches.len(),
        batches,
    }
}
