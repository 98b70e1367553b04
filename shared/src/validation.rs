//! Validation utilities for the Restaurant Inventory Management Platform

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Validate that a batch quantity is non-negative
pub fn validate_stock_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Stock quantity cannot be negative");
    }
    Ok(())
}

/// Validate that a unit cost, when present, is non-negative
pub fn validate_unit_cost(unit_cost: Option<Decimal>) -> Result<(), &'static str> {
    if let Some(cost) = unit_cost {
        if cost < Decimal::ZERO {
            return Err("Unit cost cannot be negative");
        }
    }
    Ok(())
}

/// Validate a configured low-stock threshold
pub fn validate_threshold(threshold: Decimal) -> Result<(), &'static str> {
    if threshold <= Decimal::ZERO {
        return Err("Low-stock threshold must be positive");
    }
    Ok(())
}

/// Validate a sold quantity from a sales import line
pub fn validate_quantity_sold(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity sold must be positive");
    }
    Ok(())
}

/// Validate an item name used as a business key
pub fn validate_item_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Item name cannot be empty");
    }
    Ok(())
}

/// Validate an optional date range for history queries
pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), &'static str> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err("End date cannot be before start date");
        }
    }
    Ok(())
}
