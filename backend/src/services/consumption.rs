//! FIFO consumption engine
//!
//! Deducts ingredient stock when menu items are sold: resolves the recipe of
//! each sold item, converts per-serving demands into the ingredient's
//! inventory unit, allocates the deduction across "today" batches oldest
//! batch first, writes one audit transaction per batch touched, and reports
//! shortages back-converted into the recipe's unit so operators read them in
//! the unit the recipe was written in. Earlier deductions are kept when a
//! later batch runs short; callers that need all-or-nothing per sale set
//! `validate_first`.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::{
    convert_named, plan_fifo_deduction, validate_quantity_sold, BatchLot, Collection, StockStatus,
    Unit,
};

use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditLog, NewStockTransaction};
use crate::services::status::AggregateStatusService;
use crate::services::store::{BatchStore, RecipeLine};
use crate::services::threshold::ThresholdResolver;

/// One sold menu item from a sales import
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaleLine {
    #[validate(length(min = 1, message = "item_name cannot be empty"))]
    pub item_name: String,
    #[validate(custom = "validate_sold")]
    pub quantity_sold: Decimal,
    pub sale_date: Option<NaiveDate>,
}

fn validate_sold(quantity: &Decimal) -> Result<(), validator::ValidationError> {
    validate_quantity_sold(*quantity)
        .map_err(|_| validator::ValidationError::new("quantity_sold_positive"))
}

/// Input for the sales import operation
#[derive(Debug, Deserialize, Validate)]
pub struct SalesImportInput {
    #[validate]
    pub sales: Vec<SaleLine>,
    /// When false, sales are accepted but no stock is deducted
    #[serde(default = "default_true")]
    pub auto_deduct: bool,
    /// Validate availability of every ingredient of a sale before deducting
    /// any of them
    #[serde(default)]
    pub validate_first: bool,
}

fn default_true() -> bool {
    true
}

/// One executed batch deduction
#[derive(Debug, Clone, Serialize)]
pub struct DeductionRecord {
    pub sale_item: String,
    pub ingredient: String,
    pub batch_date: NaiveDate,
    pub quantity_before: Decimal,
    pub quantity_deducted: Decimal,
    pub quantity_after: Decimal,
    /// Inventory unit the deduction was expressed in
    pub unit: String,
    pub conversion_applied: bool,
}

/// A per-ingredient problem that did not abort sibling ingredients
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionIssue {
    pub sale_item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<String>,
    pub code: String,
    pub message: String,
}

/// A pre-check failure: the sale was skipped before any deduction
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFailure {
    pub sale_item: String,
    pub ingredient: String,
    pub required: Decimal,
    pub available: Decimal,
    pub unit: String,
}

/// Status resynchronization performed after the import
#[derive(Debug, Clone, Serialize)]
pub struct ItemStatusUpdate {
    pub item_name: String,
    pub status: StockStatus,
}

/// Full report of a sales import
#[derive(Debug, Serialize)]
pub struct SalesImportReport {
    pub deductions: Vec<DeductionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ConsumptionIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_failures: Option<Vec<ValidationFailure>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updates: Option<Vec<ItemStatusUpdate>>,
}

/// A recipe ingredient with its demand resolved into the inventory unit
struct ResolvedDemand {
    ingredient: String,
    demand: Decimal,
    inventory_unit: String,
    recipe_unit: String,
    recipe_quantity: Decimal,
    conversion_applied: bool,
}

/// FIFO consumption engine
#[derive(Clone)]
pub struct ConsumptionService {
    store: BatchStore,
    thresholds: Arc<ThresholdResolver>,
    status: AggregateStatusService,
    audit: AuditLog,
}

impl ConsumptionService {
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

    /// Process a list of sold menu items, deducting ingredient stock FIFO.
    pub async fn process_sales(&self, input: SalesImportInput) -> AppResult<SalesImportReport> {
        for line in &input.sales {
            validate_quantity_sold(line.quantity_sold).map_err(|msg| AppError::Validation {
                field: "quantity_sold".to_string(),
                message: format!("{} (item '{}')", msg, line.item_name),
            })?;
        }

        let mut report = SalesImportReport {
            deductions: Vec::new(),
            errors: None,
            validation_failures: None,
            status_updates: None,
        };

        if !input.auto_deduct {
            return Ok(report);
        }

        let import_id = Uuid::new_v4();
        let mut errors: Vec<ConsumptionIssue> = Vec::new();
        let mut validation_failures: Vec<ValidationFailure> = Vec::new();
        let mut touched: BTreeSet<String> = BTreeSet::new();

        for line in &input.sales {
            let recipe = self.store.recipe_for(&line.item_name).await?;
            if recipe.is_empty() {
                errors.push(ConsumptionIssue {
                    sale_item: line.item_name.clone(),
                    ingredient: None,
                    code: "NO_RECIPE".to_string(),
                    message: format!("no recipe configured for '{}'", line.item_name),
                });
                continue;
            }

            let demands = self
                .resolve_demands(line, &recipe, &mut errors)
                .await;

            if input.validate_first {
                let failures = self.precheck(line, &demands).await?;
                if !failures.is_empty() {
                    validation_failures.extend(failures);
                    continue;
                }
            }

            let sale_date = line.sale_date.unwrap_or_else(|| Utc::now().date_naive());
            let reference = format!("sale:{}:{}", import_id, sale_date);

            for demand in &demands {
                self.deduct_ingredient(line, demand, &reference, &mut report, &mut errors)
                    .await?;
                touched.insert(demand.ingredient.to_lowercase());
            }
        }

        // Resynchronize aggregate status once per distinct ingredient touched
        let mut status_updates = Vec::new();
        for name in touched {
            match self.status.recalculate(Collection::Today, &name).await {
                Ok(result) => status_updates.push(ItemStatusUpdate {
                    item_name: name,
                    status: result.aggregate_status,
                }),
                Err(e) => {
                    tracing::error!(item_name = %name, error = %e, "status resync failed after deduction");
                }
            }
        }

        report.errors = (!errors.is_empty()).then_some(errors);
        report.validation_failures = (!validation_failures.is_empty()).then_some(validation_failures);
        report.status_updates = (!status_updates.is_empty()).then_some(status_updates);
        Ok(report)
    }

    /// Convert each recipe line's demand into the ingredient's inventory
    /// unit. Incompatible or unknown units are recorded and the ingredient
    /// skipped; siblings are unaffected.
    async fn resolve_demands(
        &self,
        line: &SaleLine,
        recipe: &[RecipeLine],
        errors: &mut Vec<ConsumptionIssue>,
    ) -> Vec<ResolvedDemand> {
        let mut demands = Vec::with_capacity(recipe.len());

        for ingredient in recipe {
            let recipe_demand = ingredient.quantity_per_serving * line.quantity_sold;
            let resolved = self.thresholds.resolve(&ingredient.ingredient_name).await;
            if resolved.is_fallback {
                tracing::debug!(
                    ingredient = %ingredient.ingredient_name,
                    "no threshold row; deducting in the recipe's own unit"
                );
            }
            let inventory_unit = resolved
                .default_unit
                .unwrap_or_else(|| ingredient.unit.clone());

            let conversion_applied = match (Unit::parse(&ingredient.unit), Unit::parse(&inventory_unit)) {
                (Ok(from), Ok(to)) => from != to,
                _ => false,
            };

            match convert_named(recipe_demand, &ingredient.unit, &inventory_unit) {
                Ok(demand) => demands.push(ResolvedDemand {
                    ingredient: ingredient.ingredient_name.clone(),
                    demand,
                    inventory_unit,
                    recipe_unit: ingredient.unit.clone(),
                    recipe_quantity: recipe_demand,
                    conversion_applied,
                }),
                Err(e) => errors.push(ConsumptionIssue {
                    sale_item: line.item_name.clone(),
                    ingredient: Some(ingredient.ingredient_name.clone()),
                    code: "UNSUPPORTED_CONVERSION".to_string(),
                    message: e.to_string(),
                }),
            }
        }

        demands
    }

    /// Pre-check availability for every ingredient of one sale
    async fn precheck(
        &self,
        line: &SaleLine,
        demands: &[ResolvedDemand],
    ) -> AppResult<Vec<ValidationFailure>> {
        let mut failures = Vec::new();

        for demand in demands {
            let batches = self
                .store
                .fetch_batches(Collection::Today, &demand.ingredient)
                .await?;
            let available: Decimal = batches.iter().map(|b| b.stock_quantity).sum();
            if available < demand.demand {
                failures.push(ValidationFailure {
                    sale_item: line.item_name.clone(),
                    ingredient: demand.ingredient.clone(),
                    required: self.in_recipe_unit(demand.demand, demand),
                    available: self.in_recipe_unit(available, demand),
                    unit: demand.recipe_unit.clone(),
                });
            }
        }

        Ok(failures)
    }

    /// Deduct one ingredient's demand across its today batches, oldest first
    async fn deduct_ingredient(
        &self,
        line: &SaleLine,
        demand: &ResolvedDemand,
        reference: &str,
        report: &mut SalesImportReport,
        errors: &mut Vec<ConsumptionIssue>,
    ) -> AppResult<()> {
        let batches = self
            .store
            .fetch_batches(Collection::Today, &demand.ingredient)
            .await?;

        let lots: Vec<BatchLot> = batches
            .iter()
            .map(|b| BatchLot {
                batch_date: b.batch_date,
                quantity: b.stock_quantity,
            })
            .collect();

        let plan = plan_fifo_deduction(&lots, demand.demand);
        let mut shortfall = plan.shortfall;

        for allocation in &plan.allocations {
            let batch = &batches[allocation.lot_index];
            let applied = self
                .store
                .guarded_deduct(
                    Collection::Today,
                    batch.item_id,
                    batch.batch_date,
                    allocation.quantity_before,
                    allocation.deducted,
                )
                .await?;

            if !applied {
                // The batch changed between planning and writing; report the
                // amount as shortage rather than guessing a new split.
                tracing::warn!(
                    ingredient = %demand.ingredient,
                    batch_date = %batch.batch_date,
                    "batch quantity changed while deducting; allocation skipped"
                );
                shortfall += allocation.deducted;
                continue;
            }

            self.audit
                .record(NewStockTransaction {
                    item_name: demand.ingredient.clone(),
                    batch_date: Some(batch.batch_date),
                    collection: Collection::Today,
                    quantity_before: Some(allocation.quantity_before),
                    quantity_change: -allocation.deducted,
                    quantity_after: Some(allocation.quantity_after),
                    reference: Some(reference.to_string()),
                    recipe_unit: Some(demand.recipe_unit.clone()),
                    recipe_quantity: Some(demand.recipe_quantity),
                    conversion_applied: demand.conversion_applied,
                    actor: "SalesImport".to_string(),
                })
                .await;

            report.deductions.push(DeductionRecord {
                sale_item: line.item_name.clone(),
                ingredient: demand.ingredient.clone(),
                batch_date: batch.batch_date,
                quantity_before: allocation.quantity_before,
                quantity_deducted: allocation.deducted,
                quantity_after: allocation.quantity_after,
                unit: demand.inventory_unit.clone(),
                conversion_applied: demand.conversion_applied,
            });
        }

        if shortfall > Decimal::ZERO {
            // Shortages are reported in the recipe's own unit
            let short_in_recipe_unit = self.in_recipe_unit(shortfall, demand);
            errors.push(ConsumptionIssue {
                sale_item: line.item_name.clone(),
                ingredient: Some(demand.ingredient.clone()),
                code: "INSUFFICIENT_STOCK".to_string(),
                message: format!(
                    "short {} {} of '{}' for '{}'",
                    short_in_recipe_unit, demand.recipe_unit, demand.ingredient, line.item_name
                ),
            });
        }

        Ok(())
    }

    /// Back-convert an inventory-unit amount into the recipe's unit for
    /// operator-readable reporting. Falls back to the raw amount when the
    /// conversion cannot be expressed.
    fn in_recipe_unit(&self, amount: Decimal, demand: &ResolvedDemand) -> Decimal {
        convert_named(amount, &demand.inventory_unit, &demand.recipe_unit).unwrap_or(amount)
    }
}
