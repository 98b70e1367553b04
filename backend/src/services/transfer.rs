//! Stage transfer jobs
//!
//! The three time-triggered transitions that migrate batches between
//! life-stages: surplus to today in the morning, today back to surplus at
//! night, and expired batches from all active collections into spoilage.
//! Every transition is idempotent and re-entrant: moves use upsert-or-merge
//! with delete-after-success, so re-running after an interruption is safe.
//! Failures in one item's processing never abort the remaining items.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;

use shared::{consolidate_expired, plan_transfer, Collection, ExpiredRow, TransferAction};

use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditLog, NewStockTransaction, SYSTEM_ACTOR};
use crate::services::status::AggregateStatusService;
use crate::services::store::{BatchStore, TransferOutcome};
use crate::services::threshold::ThresholdResolver;
use crate::AppState;

/// Reason written to spoilage rows created by the expiry scan
const EXPIRED_REASON: &str = "Expired";

/// Summary of one transfer run
#[derive(Debug, Clone, Serialize)]
pub struct TransferRunSummary {
    pub job: String,
    pub processed: usize,
    pub inserted: usize,
    pub merged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TransferRunSummary {
    fn new(job: &str) -> Self {
        Self {
            job: job.to_string(),
            processed: 0,
            inserted: 0,
            merged: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

/// Transfer scheduler job bodies
#[derive(Clone)]
pub struct TransferService {
    store: BatchStore,
    thresholds: Arc<ThresholdResolver>,
    status: AggregateStatusService,
    audit: AuditLog,
}

impl TransferService {
    pub fn new(
        store: BatchStore,
        thresholds: Arc<ThresholdResolver>,
        status: AggregateStatusService,
        audit: AuditLog,
    ) -> Self {
        Self {
            store,
            thresholds,
            status,
            audit,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        let store = BatchStore::new(state.db.clone());
        let status = AggregateStatusService::new(store.clone(), state.thresholds.clone());
        Self::new(
            store,
            state.thresholds.clone(),
            status,
            AuditLog::new(state.db.clone()),
        )
    }

    /// Morning transition: every surplus batch moves into today's stock.
    pub async fn surplus_to_today(&self) -> AppResult<TransferRunSummary> {
        self.move_collection(Collection::Surplus, Collection::Today, "surplus_to_today")
            .await
    }

    /// Evening transition: today's leftover stock moves back to surplus.
    pub async fn today_to_surplus(&self) -> AppResult<TransferRunSummary> {
        self.move_collection(Collection::Today, Collection::Surplus, "today_to_surplus")
            .await
    }

    async fn move_collection(
        &self,
        source: Collection,
        target: Collection,
        job: &str,
    ) -> AppResult<TransferRunSummary> {
        let batches = self.store.fetch_all(source).await?;
        let mut summary = TransferRunSummary::new(job);
        let mut touched: BTreeSet<String> = BTreeSet::new();

        tracing::info!(job, batches = batches.len(), "transfer run starting");

        for batch in &batches {
            summary.processed += 1;

            let moved = async {
                let threshold = self.thresholds.threshold_for(&batch.item_name).await;
                let existing = self
                    .store
                    .fetch_by_key(target, batch.item_id, batch.batch_date)
                    .await?
                    .map(|b| b.stock_quantity);

                // Freshly inserted rows carry the status of the transferred
                // quantity; merges keep the row and are resynchronized by the
                // aggregate roll-up after the run.
                let status_for_insert = match plan_transfer(batch.stock_quantity, existing, threshold)
                {
                    TransferAction::Insert { status } => status,
                    TransferAction::MergeAdd { .. } => batch.status(),
                };

                self.store
                    .transfer_batch(source, target, batch.item_id, batch.batch_date, status_for_insert)
                    .await
            }
            .await;

            match moved {
                Ok(Some(outcome)) => {
                    match outcome {
                        TransferOutcome::Inserted { .. } => summary.inserted += 1,
                        TransferOutcome::Merged { .. } => summary.merged += 1,
                    }
                    touched.insert(batch.item_name.to_lowercase());
                    self.audit
                        .record(NewStockTransaction {
                            item_name: batch.item_name.clone(),
                            batch_date: Some(batch.batch_date),
                            collection: target,
                            quantity_before: None,
                            quantity_change: batch.stock_quantity,
                            quantity_after: match &outcome {
                                TransferOutcome::Inserted { quantity } => Some(*quantity),
                                TransferOutcome::Merged { merged_quantity } => Some(*merged_quantity),
                            },
                            reference: Some(job.to_string()),
                            recipe_unit: None,
                            recipe_quantity: None,
                            conversion_applied: false,
                            actor: SYSTEM_ACTOR.to_string(),
                        })
                        .await;
                }
                Ok(None) => {
                    // Gone already: moved by a concurrent or interrupted run
                    summary.skipped += 1;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        job,
                        item_name = %batch.item_name,
                        batch_date = %batch.batch_date,
                        error = %e,
                        "batch transfer failed; continuing with remaining batches"
                    );
                }
            }
        }

        self.resync_statuses(&touched, &[source, target]).await;

        tracing::info!(
            job,
            inserted = summary.inserted,
            merged = summary.merged,
            skipped = summary.skipped,
            failed = summary.failed,
            "transfer run finished"
        );
        Ok(summary)
    }

    /// Expiry scan: move batches past their expiration date from all active
    /// collections into spoilage, one consolidated row per
    /// `(item_id, batch_date)`.
    pub async fn expired_to_spoilage(&self) -> AppResult<TransferRunSummary> {
        let job = "expired_to_spoilage";
        let today = Local::now().date_naive();

        let mut rows = Vec::new();
        for collection in Collection::active() {
            for batch in self.store.fetch_expired(collection, today).await? {
                let Some(expiration_date) = batch.expiration_date else {
                    continue;
                };
                rows.push(ExpiredRow {
                    collection,
                    item_id: batch.item_id,
                    item_name: batch.item_name.clone(),
                    category: batch.category.clone(),
                    batch_date: batch.batch_date,
                    quantity: batch.stock_quantity,
                    expiration_date,
                });
            }
        }

        let groups = consolidate_expired(rows);
        let mut summary = TransferRunSummary::new(job);
        let mut touched: BTreeSet<String> = BTreeSet::new();

        if !groups.is_empty() {
            tracing::info!(job, groups = groups.len(), "spoilage consolidation starting");
        }

        for group in &groups {
            summary.processed += 1;
            match self
                .store
                .consolidate_spoilage(group, EXPIRED_REASON, today)
                .await
            {
                // The spoiled quantity comes from the consolidation's own
                // locked re-read, not the scan: the rows may have changed in
                // between.
                Ok(Some(quantity_spoiled)) => {
                    summary.inserted += 1;
                    touched.insert(group.item_name.to_lowercase());
                    self.audit
                        .record(NewStockTransaction {
                            item_name: group.item_name.clone(),
                            batch_date: Some(group.batch_date),
                            collection: Collection::Spoilage,
                            quantity_before: None,
                            quantity_change: quantity_spoiled,
                            quantity_after: Some(quantity_spoiled),
                            reference: Some(job.to_string()),
                            recipe_unit: None,
                            recipe_quantity: None,
                            conversion_applied: false,
                            actor: SYSTEM_ACTOR.to_string(),
                        })
                        .await;
                }
                Ok(None) => {
                    // All source rows moved or consumed since the scan
                    summary.skipped += 1;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        job,
                        item_name = %group.item_name,
                        batch_date = %group.batch_date,
                        error = %e,
                        "spoilage consolidation failed; continuing with remaining groups"
                    );
                }
            }
        }

        self.resync_statuses(&touched, &Collection::active()).await;
        Ok(summary)
    }

    /// Re-run the aggregate roll-up for every touched item in the affected
    /// collections. Items fully moved out of a collection read as NotFound
    /// there, which is expected.
    async fn resync_statuses(&self, items: &BTreeSet<String>, collections: &[Collection]) {
        for name in items {
            for &collection in collections {
                match self.status.recalculate(collection, name).await {
                    Ok(_) | Err(AppError::NotFound(_)) => {}
                    Err(e) => {
                        tracing::error!(
                            item_name = %name,
                            collection = %collection.as_str(),
                            error = %e,
                            "status resync failed after transfer"
                        );
                    }
                }
            }
        }
    }
}
