//! Stock transaction audit log
//!
//! Append-only record of every quantity movement: sales deductions, scheduled
//! transfers and spoilage consolidation. Scheduled jobs write entries under
//! the synthetic "System" actor. Audit writes are best-effort: a failure
//! here is logged and must never abort the primary operation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use shared::Collection;

/// Actor recorded for scheduler-initiated movements
pub const SYSTEM_ACTOR: &str = "System";

/// Input for one audit entry
#[derive(Debug, Clone)]
pub struct NewStockTransaction {
    pub item_name: String,
    pub batch_date: Option<NaiveDate>,
    pub collection: Collection,
    pub quantity_before: Option<Decimal>,
    /// Negative for deductions
    pub quantity_change: Decimal,
    pub quantity_after: Option<Decimal>,
    /// Sale id or job name that caused the movement
    pub reference: Option<String>,
    pub recipe_unit: Option<String>,
    pub recipe_quantity: Option<Decimal>,
    pub conversion_applied: bool,
    pub actor: String,
}

/// Audit log writer
#[derive(Clone)]
pub struct AuditLog {
    db: PgPool,
}

impl AuditLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append one audit entry. Failures are logged and swallowed.
    pub async fn record(&self, entry: NewStockTransaction) {
        let result = sqlx::query(
            "INSERT INTO stock_transactions (item_name, batch_date, collection_name, \
                 quantity_before, quantity_change, quantity_after, reference, \
                 recipe_unit, recipe_quantity, conversion_applied, actor) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&entry.item_name)
        .bind(entry.batch_date)
        .bind(entry.collection.as_str())
        .bind(entry.quantity_before)
        .bind(entry.quantity_change)
        .bind(entry.quantity_after)
        .bind(&entry.reference)
        .bind(&entry.recipe_unit)
        .bind(entry.recipe_quantity)
        .bind(entry.conversion_applied)
        .bind(&entry.actor)
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            tracing::error!(
                item_name = %entry.item_name,
                error = %e,
                "failed to append stock transaction audit entry"
            );
        }
    }
}
