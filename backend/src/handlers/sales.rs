//! HTTP handlers for sales import and stock deduction

use axum::{extract::State, Json};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;
use crate::services::consumption::{ConsumptionService, SalesImportInput, SalesImportReport};
use crate::services::status::AggregateStatusService;
use crate::services::store::BatchStore;
use crate::AppState;

/// Import a list of sold menu items, deducting ingredient stock FIFO
pub async fn import_sales(
    State(state): State<AppState>,
    Json(input): Json<SalesImportInput>,
) -> AppResult<Json<SalesImportReport>> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let store = BatchStore::new(state.db.clone());
    let status = AggregateStatusService::new(store.clone(), state.thresholds.clone());
    let service = ConsumptionService::new(
        store,
        state.thresholds.clone(),
        status,
        AuditLog::new(state.db.clone()),
    );
    let report = service.process_sales(input).await?;
    Ok(Json(report))
}
