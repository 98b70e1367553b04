//! HTTP handlers for manually triggering the scheduled transfers
//!
//! The job bodies are the same ones the scheduler runs; exposing them lets
//! operators re-run a transition without waiting for its next trigger.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{AppError, AppResult};
use crate::services::transfer::{TransferRunSummary, TransferService};
use crate::AppState;

/// Run one named transfer transition immediately
pub async fn run_transfer(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<TransferRunSummary>> {
    let service = TransferService::from_state(&state);

    let summary = match name.as_str() {
        "surplus-to-today" => service.surplus_to_today().await?,
        "today-to-surplus" => service.today_to_surplus().await?,
        "expired-to-spoilage" => service.expired_to_spoilage().await?,
        other => {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: format!(
                    "unknown transfer '{}': expected surplus-to-today, today-to-surplus or expired-to-spoilage",
                    other
                ),
            })
        }
    };

    Ok(Json(summary))
}
