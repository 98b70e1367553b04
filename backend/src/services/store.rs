//! Batch store adapter
//!
//! Typed CRUD over the four batch collections, their archived shadows, the
//! threshold-settings table and the recipe table. All SQL against batch rows
//! lives here; the engines above it (aggregate status, consumption, transfer)
//! compose these operations. Multi-statement sequences that must not tear
//! (transfer moves, archival, spoilage consolidation) run inside a single
//! transaction with the source row locked.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::{refresh_spoilage_group, Collection, SpoilageGroup, StockStatus};

use crate::error::{AppError, AppResult};

/// Store adapter for the batch collections
#[derive(Clone)]
pub struct BatchStore {
    db: PgPool,
}

/// One batch row from master/today/surplus (or an archived shadow)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Batch {
    pub id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub category: Option<String>,
    pub batch_date: NaiveDate,
    pub stock_quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub expiration_date: Option<NaiveDate>,
    pub stock_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    pub fn status(&self) -> StockStatus {
        StockStatus::from_str(&self.stock_status).unwrap_or(StockStatus::OutOfStock)
    }
}

/// Input for inserting a batch into an active collection
#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub item_id: i64,
    pub item_name: String,
    pub category: Option<String>,
    pub batch_date: NaiveDate,
    pub stock_quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub expiration_date: Option<NaiveDate>,
    pub stock_status: StockStatus,
}

/// An archived batch row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArchivedBatch {
    pub id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub category: Option<String>,
    pub batch_date: NaiveDate,
    pub stock_quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub expiration_date: Option<NaiveDate>,
    pub stock_status: String,
    pub archived_at: DateTime<Utc>,
    pub archived_reason: String,
    pub original_table: String,
}

/// Filters for the archived-history query
#[derive(Debug, Clone, Default)]
pub struct ArchivedQuery {
    pub item_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i64,
    pub skip: i64,
}

/// One configured threshold row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ThresholdSetting {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub default_unit: Option<String>,
    pub low_stock_threshold: Decimal,
}

/// One recipe line: an ingredient and its per-serving quantity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecipeLine {
    pub ingredient_name: String,
    pub quantity_per_serving: Decimal,
    pub unit: String,
}

/// Result of moving one batch into a target collection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TransferOutcome {
    /// No target row existed; a new one was inserted
    Inserted { quantity: Decimal },
    /// A target row with the same key existed; quantities were merge-added
    Merged { merged_quantity: Decimal },
}

const BATCH_COLUMNS: &str = "id, item_id, item_name, category, batch_date, stock_quantity, \
     unit_cost, expiration_date, stock_status, created_at, updated_at";

fn active_table(collection: Collection) -> AppResult<&'static str> {
    match collection {
        Collection::Spoilage => Err(AppError::Validation {
            field: "table".to_string(),
            message: "Spoilage is append-only and has no batch CRUD".to_string(),
        }),
        other => Ok(other.table()),
    }
}

impl BatchStore {
    /// Create a new BatchStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All batches of one item in a collection, oldest batch first
    pub async fn fetch_batches(
        &self,
        collection: Collection,
        item_name: &str,
    ) -> AppResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM {} WHERE LOWER(item_name) = LOWER($1) \
             ORDER BY batch_date ASC, id ASC",
            active_table(collection)?
        );
        let batches = sqlx::query_as::<_, Batch>(&sql)
            .bind(item_name)
            .fetch_all(&self.db)
            .await?;
        Ok(batches)
    }

    /// Every batch in a collection, oldest batch first
    pub async fn fetch_all(&self, collection: Collection) -> AppResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM {} ORDER BY batch_date ASC, id ASC",
            active_table(collection)?
        );
        let batches = sqlx::query_as::<_, Batch>(&sql).fetch_all(&self.db).await?;
        Ok(batches)
    }

    /// One batch by its `(item_id, batch_date)` uniqueness key
    pub async fn fetch_by_key(
        &self,
        collection: Collection,
        item_id: i64,
        batch_date: NaiveDate,
    ) -> AppResult<Option<Batch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM {} WHERE item_id = $1 AND batch_date = $2",
            active_table(collection)?
        );
        let batch = sqlx::query_as::<_, Batch>(&sql)
            .bind(item_id)
            .bind(batch_date)
            .fetch_optional(&self.db)
            .await?;
        Ok(batch)
    }

    /// Distinct item names present in a collection
    pub async fn distinct_item_names(&self, collection: Collection) -> AppResult<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT LOWER(item_name) FROM {} ORDER BY 1",
            active_table(collection)?
        );
        let names = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(names)
    }

    /// Batches whose expiration date has passed as of `as_of`
    pub async fn fetch_expired(
        &self,
        collection: Collection,
        as_of: NaiveDate,
    ) -> AppResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM {} \
             WHERE expiration_date IS NOT NULL AND expiration_date <= $1 \
             ORDER BY item_id ASC, batch_date ASC",
            active_table(collection)?
        );
        let batches = sqlx::query_as::<_, Batch>(&sql)
            .bind(as_of)
            .fetch_all(&self.db)
            .await?;
        Ok(batches)
    }

    /// Insert a new batch into an active collection
    pub async fn insert_batch(&self, collection: Collection, input: NewBatch) -> AppResult<Batch> {
        let sql = format!(
            "INSERT INTO {} (item_id, item_name, category, batch_date, stock_quantity, \
                             unit_cost, expiration_date, stock_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {BATCH_COLUMNS}",
            active_table(collection)?
        );
        let batch = sqlx::query_as::<_, Batch>(&sql)
            .bind(input.item_id)
            .bind(&input.item_name)
            .bind(&input.category)
            .bind(input.batch_date)
            .bind(input.stock_quantity)
            .bind(input.unit_cost)
            .bind(input.expiration_date)
            .bind(input.stock_status.as_str())
            .fetch_one(&self.db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::DuplicateEntry("item_id/batch_date".to_string())
                }
                _ => AppError::DatabaseError(e),
            })?;
        Ok(batch)
    }

    /// Atomically deduct from one batch, guarded by the quantity the caller
    /// planned against. Returns false when the row changed underneath the
    /// plan (or disappeared), so the caller can re-read and re-plan.
    pub async fn guarded_deduct(
        &self,
        collection: Collection,
        item_id: i64,
        batch_date: NaiveDate,
        expected_quantity: Decimal,
        deduct: Decimal,
    ) -> AppResult<bool> {
        let sql = format!(
            "UPDATE {} SET stock_quantity = stock_quantity - $4, updated_at = NOW() \
             WHERE item_id = $1 AND batch_date = $2 AND stock_quantity = $3",
            active_table(collection)?
        );
        let result = sqlx::query(&sql)
            .bind(item_id)
            .bind(batch_date)
            .bind(expected_quantity)
            .bind(deduct)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Write one status to every batch of an item in a collection.
    /// This is the aggregate roll-up's primary write; it runs as a single
    /// statement and is therefore atomic.
    pub async fn update_item_status(
        &self,
        collection: Collection,
        item_name: &str,
        status: StockStatus,
    ) -> AppResult<u64> {
        let sql = format!(
            "UPDATE {} SET stock_status = $2, updated_at = NOW() \
             WHERE LOWER(item_name) = LOWER($1)",
            active_table(collection)?
        );
        let result = sqlx::query(&sql)
            .bind(item_name)
            .bind(status.as_str())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Move depleted batches to the collection's archived shadow table.
    /// Insert-then-delete runs in one transaction per call; only rows still
    /// at zero quantity are moved, so a concurrent restock cannot be lost.
    pub async fn archive_batches(
        &self,
        collection: Collection,
        batch_ids: &[i64],
        reason: &str,
    ) -> AppResult<u64> {
        let table = active_table(collection)?;
        let shadow = collection
            .archived_table()
            .ok_or_else(|| AppError::Internal("collection has no archived shadow".to_string()))?;

        let mut tx = self.db.begin().await?;

        let insert_sql = format!(
            "INSERT INTO {shadow} (item_id, item_name, category, batch_date, stock_quantity, \
                                   unit_cost, expiration_date, stock_status, archived_reason, original_table) \
             SELECT item_id, item_name, category, batch_date, stock_quantity, \
                    unit_cost, expiration_date, stock_status, $2, '{table}' \
             FROM {table} WHERE id = ANY($1) AND stock_quantity = 0"
        );
        sqlx::query(&insert_sql)
            .bind(batch_ids)
            .bind(reason)
            .execute(&mut *tx)
            .await?;

        let delete_sql = format!("DELETE FROM {table} WHERE id = ANY($1) AND stock_quantity = 0");
        let deleted = sqlx::query(&delete_sql)
            .bind(batch_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted)
    }

    /// Move one batch from `source` to `target` with upsert-or-merge
    /// semantics, deleting the source row on success. The whole move is one
    /// transaction with the source row locked, so a retry of an interrupted
    /// run sees either the original state or the completed move.
    pub async fn transfer_batch(
        &self,
        source: Collection,
        target: Collection,
        item_id: i64,
        batch_date: NaiveDate,
        status_for_insert: StockStatus,
    ) -> AppResult<Option<TransferOutcome>> {
        let source_table = active_table(source)?;
        let target_table = active_table(target)?;

        let mut tx = self.db.begin().await?;

        let select_sql = format!(
            "SELECT {BATCH_COLUMNS} FROM {source_table} \
             WHERE item_id = $1 AND batch_date = $2 FOR UPDATE"
        );
        let Some(batch) = sqlx::query_as::<_, Batch>(&select_sql)
            .bind(item_id)
            .bind(batch_date)
            .fetch_optional(&mut *tx)
            .await?
        else {
            // Already moved by a previous (possibly interrupted) run
            tx.rollback().await?;
            return Ok(None);
        };

        let upsert_sql = format!(
            "INSERT INTO {target_table} (item_id, item_name, category, batch_date, stock_quantity, \
                                         unit_cost, expiration_date, stock_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (item_id, batch_date) DO UPDATE \
             SET stock_quantity = {target_table}.stock_quantity + EXCLUDED.stock_quantity, \
                 updated_at = NOW() \
             RETURNING stock_quantity, (xmax = 0) AS inserted"
        );
        let (quantity, inserted): (Decimal, bool) = sqlx::query_as(&upsert_sql)
            .bind(batch.item_id)
            .bind(&batch.item_name)
            .bind(&batch.category)
            .bind(batch.batch_date)
            .bind(batch.stock_quantity)
            .bind(batch.unit_cost)
            .bind(batch.expiration_date)
            .bind(status_for_insert.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let delete_sql = format!("DELETE FROM {source_table} WHERE id = $1");
        sqlx::query(&delete_sql).bind(batch.id).execute(&mut *tx).await?;

        tx.commit().await?;

        Ok(Some(if inserted {
            TransferOutcome::Inserted { quantity }
        } else {
            TransferOutcome::Merged {
                merged_quantity: quantity,
            }
        }))
    }

    /// Insert one consolidated spoilage row and delete every contributing
    /// source row, all in one transaction. The source rows are re-read under
    /// lock and the spoiled quantity recomputed from their live values, so a
    /// transfer or deduction landing between the expiry scan and this call is
    /// counted instead of silently deleted. Returns the quantity actually
    /// spoiled, or None when every source row is already gone.
    pub async fn consolidate_spoilage(
        &self,
        group: &SpoilageGroup,
        reason: &str,
        spoilage_date: NaiveDate,
    ) -> AppResult<Option<Decimal>> {
        let mut tx = self.db.begin().await?;

        let mut live: Vec<(Collection, Decimal)> = Vec::new();
        for &source in &group.sources {
            let select_sql = format!(
                "SELECT stock_quantity FROM {} WHERE item_id = $1 AND batch_date = $2 FOR UPDATE",
                active_table(source)?
            );
            if let Some(quantity) = sqlx::query_scalar::<_, Decimal>(&select_sql)
                .bind(group.item_id)
                .bind(group.batch_date)
                .fetch_optional(&mut *tx)
                .await?
            {
                live.push((source, quantity));
            }
        }

        let Some(refreshed) = refresh_spoilage_group(group, &live) else {
            // Every source row was moved or consumed since the scan
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO spoilage_batches (item_id, item_name, category, batch_date, \
                                           quantity_spoiled, reason, spoilage_date, expiration_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(refreshed.item_id)
        .bind(&refreshed.item_name)
        .bind(&refreshed.category)
        .bind(refreshed.batch_date)
        .bind(refreshed.quantity_spoiled)
        .bind(reason)
        .bind(spoilage_date)
        .bind(refreshed.expiration_date)
        .execute(&mut *tx)
        .await?;

        for source in &refreshed.sources {
            let delete_sql = format!(
                "DELETE FROM {} WHERE item_id = $1 AND batch_date = $2",
                active_table(*source)?
            );
            sqlx::query(&delete_sql)
                .bind(refreshed.item_id)
                .bind(refreshed.batch_date)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(refreshed.quantity_spoiled))
    }

    /// Paginated archived-batch history with total count
    pub async fn archived_history(
        &self,
        collection: Collection,
        query: &ArchivedQuery,
    ) -> AppResult<(Vec<ArchivedBatch>, i64)> {
        let shadow = collection.archived_table().ok_or_else(|| AppError::Validation {
            field: "table".to_string(),
            message: "Spoilage has no archived history".to_string(),
        })?;

        let filter = "($1::VARCHAR IS NULL OR LOWER(item_name) = LOWER($1)) \
             AND ($2::DATE IS NULL OR archived_at::DATE >= $2) \
             AND ($3::DATE IS NULL OR archived_at::DATE <= $3)";

        let rows_sql = format!(
            "SELECT id, item_id, item_name, category, batch_date, stock_quantity, \
                    unit_cost, expiration_date, stock_status, archived_at, archived_reason, original_table \
             FROM {shadow} WHERE {filter} \
             ORDER BY archived_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, ArchivedBatch>(&rows_sql)
            .bind(&query.item_name)
            .bind(query.start_date)
            .bind(query.end_date)
            .bind(query.limit)
            .bind(query.skip)
            .fetch_all(&self.db)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM {shadow} WHERE {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&query.item_name)
            .bind(query.start_date)
            .bind(query.end_date)
            .fetch_one(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Configured threshold row for an item name, if any
    pub async fn threshold_setting(&self, item_name: &str) -> AppResult<Option<ThresholdSetting>> {
        let setting = sqlx::query_as::<_, ThresholdSetting>(
            "SELECT id, name, category, default_unit, low_stock_threshold \
             FROM threshold_settings WHERE LOWER(name) = LOWER($1)",
        )
        .bind(item_name)
        .fetch_optional(&self.db)
        .await?;
        Ok(setting)
    }

    /// Recipe lines for a menu item (empty when no recipe is configured)
    pub async fn recipe_for(&self, menu_item_name: &str) -> AppResult<Vec<RecipeLine>> {
        let lines = sqlx::query_as::<_, RecipeLine>(
            "SELECT ingredient_name, quantity_per_serving, unit \
             FROM recipes WHERE LOWER(menu_item_name) = LOWER($1) \
             ORDER BY ingredient_name ASC",
        )
        .bind(menu_item_name)
        .fetch_all(&self.db)
        .await?;
        Ok(lines)
    }
}
