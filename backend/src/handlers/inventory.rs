//! HTTP handlers for inventory status and archived-history endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::{
    classify_stock_status, validate_date_range, validate_item_name, validate_stock_quantity,
    validate_unit_cost,
};

use crate::error::{AppError, AppResult};
use crate::models::Collection;
use crate::services::status::{AggregateStatusService, AggregateStatusReport, ItemRecalcResult};
use crate::services::store::{ArchivedBatch, ArchivedQuery, BatchStore, NewBatch};
use crate::AppState;

/// Collection selector shared by the inventory endpoints
#[derive(Debug, Deserialize)]
pub struct TableQuery {
    pub table: Option<String>,
}

/// Parse the `table` query parameter into an active collection
fn parse_table(table: &Option<String>) -> AppResult<Collection> {
    let value = table.as_deref().ok_or_else(|| AppError::Validation {
        field: "table".to_string(),
        message: "table query parameter is required (master, today or surplus)".to_string(),
    })?;
    match Collection::from_str(value) {
        Some(Collection::Spoilage) | None => Err(AppError::Validation {
            field: "table".to_string(),
            message: format!("invalid table '{}': expected master, today or surplus", value),
        }),
        Some(collection) => Ok(collection),
    }
}

/// Get the aggregate status of one item in a collection (read-only)
pub async fn get_aggregate_status(
    State(state): State<AppState>,
    Path(item_name): Path<String>,
    Query(query): Query<TableQuery>,
) -> AppResult<Json<AggregateStatusReport>> {
    let collection = parse_table(&query.table)?;
    let store = BatchStore::new(state.db.clone());
    let service = AggregateStatusService::new(store, state.thresholds.clone());
    let report = service.query(collection, &item_name).await?;
    Ok(Json(report))
}

/// Bulk recalculation response
#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    pub table: String,
    pub results: Vec<ItemRecalcResult>,
}

/// Recalculate the aggregate status of every item in a collection
pub async fn recalculate_aggregate_status(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> AppResult<Json<RecalculateResponse>> {
    let collection = parse_table(&query.table)?;
    let store = BatchStore::new(state.db.clone());
    let service = AggregateStatusService::new(store, state.thresholds.clone());
    let results = service.recalculate_all(collection).await?;
    Ok(Json(RecalculateResponse {
        table: collection.as_str().to_string(),
        results,
    }))
}

/// Input for registering a received batch
#[derive(Debug, Deserialize)]
pub struct CreateBatchInput {
    pub item_id: i64,
    pub item_name: String,
    pub category: Option<String>,
    pub batch_date: NaiveDate,
    pub stock_quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub expiration_date: Option<NaiveDate>,
}

/// Register a new batch in a collection.
/// The batch lands with the status of its own quantity, then the item's
/// aggregate roll-up rewrites every batch to the shared aggregate status.
pub async fn create_batch(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<(StatusCode, Json<AggregateStatusReport>)> {
    let collection = parse_table(&query.table)?;
    for (field, check) in [
        ("item_name", validate_item_name(&input.item_name)),
        ("stock_quantity", validate_stock_quantity(input.stock_quantity)),
        ("unit_cost", validate_unit_cost(input.unit_cost)),
    ] {
        check.map_err(|msg| AppError::Validation {
            field: field.to_string(),
            message: msg.to_string(),
        })?;
    }

    let store = BatchStore::new(state.db.clone());
    let threshold = state.thresholds.threshold_for(&input.item_name).await;
    let status = classify_stock_status(input.stock_quantity, threshold);

    store
        .insert_batch(
            collection,
            NewBatch {
                item_id: input.item_id,
                item_name: input.item_name.clone(),
                category: input.category,
                batch_date: input.batch_date,
                stock_quantity: input.stock_quantity,
                unit_cost: input.unit_cost,
                expiration_date: input.expiration_date,
                stock_status: status,
            },
        )
        .await?;

    let service = AggregateStatusService::new(store, state.thresholds.clone());
    let report = service.recalculate(collection, &input.item_name).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Query parameters for archived-batch history
#[derive(Debug, Deserialize)]
pub struct ArchivedParams {
    pub table: Option<String>,
    pub item_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// Paginated archived-batch history response
#[derive(Debug, Serialize)]
pub struct ArchivedResponse {
    pub data: Vec<ArchivedBatch>,
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

/// List archived batches with pagination and optional filters
pub async fn get_archived_batches(
    State(state): State<AppState>,
    Query(params): Query<ArchivedParams>,
) -> AppResult<Json<ArchivedResponse>> {
    let collection = parse_table(&params.table)?;
    validate_date_range(params.start_date, params.end_date).map_err(|msg| {
        AppError::Validation {
            field: "start_date/end_date".to_string(),
            message: msg.to_string(),
        }
    })?;

    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    let skip = params.skip.unwrap_or(0).max(0);

    let store = BatchStore::new(state.db.clone());
    let (data, total) = store
        .archived_history(
            collection,
            &ArchivedQuery {
                item_name: params.item_name.clone(),
                start_date: params.start_date,
                end_date: params.end_date,
                limit,
                skip,
            },
        )
        .await?;

    Ok(Json(ArchivedResponse {
        data,
        total,
        limit,
        skip,
    }))
}
