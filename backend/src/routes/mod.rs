//! Route definitions for the Restaurant Inventory Management Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Inventory status and history
        .nest("/inventory", inventory_routes())
        // Sales import / stock deduction
        .nest("/sales", sales_routes())
        // Manual transfer triggers
        .nest("/transfers", transfer_routes())
}

/// Inventory status and archived-history routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/batches", post(handlers::create_batch))
        .route(
            "/aggregate-status/:item_name",
            get(handlers::get_aggregate_status),
        )
        .route(
            "/recalculate-aggregate-status",
            post(handlers::recalculate_aggregate_status),
        )
        .route("/archived", get(handlers::get_archived_batches))
}

/// Sales import routes
fn sales_routes() -> Router<AppState> {
    Router::new().route("/import", post(handlers::import_sales))
}

/// Manual transfer trigger routes
fn transfer_routes() -> Router<AppState> {
    Router::new().route("/:name/run", post(handlers::run_transfer))
}
