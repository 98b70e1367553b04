//! Stock status classification
//!
//! The status of an item is always derived from its quantity and its
//! configured low-stock threshold; it is never authoritative on its own.
//! The same classifier is applied to single batches and to aggregated sums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock status of an item within one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    Normal,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Critical => "critical",
            StockStatus::Low => "low",
            StockStatus::Normal => "normal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "out_of_stock" => Some(StockStatus::OutOfStock),
            "critical" => Some(StockStatus::Critical),
            "low" => Some(StockStatus::Low),
            "normal" => Some(StockStatus::Normal),
            _ => None,
        }
    }
}

/// Classify a quantity against a low-stock threshold.
///
/// Boundaries are inclusive on the lower classification: exactly half the
/// threshold is `Critical`, exactly the threshold is `Low`.
pub fn classify_stock_status(quantity: Decimal, threshold: Decimal) -> StockStatus {
    let half = threshold / Decimal::from(2);

    if quantity <= Decimal::ZERO {
        StockStatus::OutOfStock
    } else if quantity <= half {
        StockStatus::Critical
    } else if quantity <= threshold {
        StockStatus::Low
    } else {
        StockStatus::Normal
    }
}
