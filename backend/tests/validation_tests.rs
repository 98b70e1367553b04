//! Tests for input validation helpers

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    validate_date_range, validate_item_name, validate_quantity_sold, validate_stock_quantity,
    validate_threshold, validate_unit_cost,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn stock_quantity_accepts_zero() {
    assert!(validate_stock_quantity(Decimal::ZERO).is_ok());
    assert!(validate_stock_quantity(dec("-0.01")).is_err());
}

#[test]
fn unit_cost_is_optional() {
    assert!(validate_unit_cost(None).is_ok());
    assert!(validate_unit_cost(Some(dec("2.50"))).is_ok());
    assert!(validate_unit_cost(Some(dec("-1"))).is_err());
}

#[test]
fn threshold_must_be_positive() {
    assert!(validate_threshold(dec("0.01")).is_ok());
    assert!(validate_threshold(Decimal::ZERO).is_err());
    assert!(validate_threshold(dec("-5")).is_err());
}

#[test]
fn quantity_sold_must_be_positive() {
    assert!(validate_quantity_sold(dec("1")).is_ok());
    assert!(validate_quantity_sold(Decimal::ZERO).is_err());
}

#[test]
fn item_name_rejects_blank() {
    assert!(validate_item_name("Tomato").is_ok());
    assert!(validate_item_name("   ").is_err());
    assert!(validate_item_name("").is_err());
}

#[test]
fn date_range_rejects_inverted_bounds() {
    assert!(validate_date_range(Some(date(2024, 1, 1)), Some(date(2024, 2, 1))).is_ok());
    assert!(validate_date_range(Some(date(2024, 2, 1)), Some(date(2024, 1, 1))).is_err());
    assert!(validate_date_range(None, Some(date(2024, 1, 1))).is_ok());
    assert!(validate_date_range(Some(date(2024, 1, 1)), None).is_ok());
    assert!(validate_date_range(None, None).is_ok());
}
