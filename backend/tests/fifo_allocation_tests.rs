//! Tests for FIFO deduction planning
//! Verifies oldest-batch-first allocation, shortfall reporting and
//! conservation of the deducted total

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{plan_fifo_deduction, BatchLot};
use std::str::FromStr;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn lot(y: i32, m: u32, d: u32, quantity: &str) -> BatchLot {
    BatchLot {
        batch_date: date(y, m, d),
        quantity: dec(quantity),
    }
}

// =============================================================================
// Allocation Order Tests
// =============================================================================

mod fifo_order {
    use super::*;

    #[test]
    fn drains_oldest_batch_first() {
        // 3 on Jan 1, 5 on Jan 5, demand 4: the old batch empties, the new
        // batch covers the remainder
        let lots = vec![lot(2024, 1, 1, "3"), lot(2024, 1, 5, "5")];
        let plan = plan_fifo_deduction(&lots, dec("4"));

        assert!(plan.is_satisfied());
        assert_eq!(plan.allocations.len(), 2);

        assert_eq!(plan.allocations[0].batch_date, date(2024, 1, 1));
        assert_eq!(plan.allocations[0].deducted, dec("3"));
        assert_eq!(plan.allocations[0].quantity_after, Decimal::ZERO);

        assert_eq!(plan.allocations[1].batch_date, date(2024, 1, 5));
        assert_eq!(plan.allocations[1].deducted, dec("1"));
        assert_eq!(plan.allocations[1].quantity_after, dec("4"));
    }

    #[test]
    fn input_order_does_not_matter() {
        // Newest listed first still allocates oldest first
        let lots = vec![lot(2024, 1, 5, "5"), lot(2024, 1, 1, "3")];
        let plan = plan_fifo_deduction(&lots, dec("4"));

        assert_eq!(plan.allocations[0].batch_date, date(2024, 1, 1));
        assert_eq!(plan.allocations[0].lot_index, 1);
        assert_eq!(plan.allocations[1].batch_date, date(2024, 1, 5));
        assert_eq!(plan.allocations[1].lot_index, 0);
    }

    #[test]
    fn same_date_keeps_input_order() {
        let lots = vec![lot(2024, 1, 1, "2"), lot(2024, 1, 1, "2")];
        let plan = plan_fifo_deduction(&lots, dec("3"));

        assert_eq!(plan.allocations[0].lot_index, 0);
        assert_eq!(plan.allocations[0].deducted, dec("2"));
        assert_eq!(plan.allocations[1].lot_index, 1);
        assert_eq!(plan.allocations[1].deducted, dec("1"));
    }

    #[test]
    fn single_batch_covers_whole_demand() {
        let lots = vec![lot(2024, 2, 1, "10")];
        let plan = plan_fifo_deduction(&lots, dec("2.5"));

        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].deducted, dec("2.5"));
        assert_eq!(plan.allocations[0].quantity_after, dec("7.5"));
    }

    #[test]
    fn empty_lots_are_skipped() {
        let lots = vec![lot(2024, 1, 1, "0"), lot(2024, 1, 2, "5")];
        let plan = plan_fifo_deduction(&lots, dec("3"));

        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].lot_index, 1);
    }
}

// =============================================================================
// Shortfall Tests
// =============================================================================

mod shortfall {
    use super::*;

    #[test]
    fn demand_exceeding_stock_reports_shortfall() {
        let lots = vec![lot(2024, 1, 1, "3"), lot(2024, 1, 5, "5")];
        let plan = plan_fifo_deduction(&lots, dec("10"));

        assert!(!plan.is_satisfied());
        assert_eq!(plan.total_deducted(), dec("8"));
        assert_eq!(plan.shortfall, dec("2"));
    }

    #[test]
    fn no_lots_means_full_shortfall() {
        let plan = plan_fifo_deduction(&[], dec("4"));

        assert!(plan.allocations.is_empty());
        assert_eq!(plan.shortfall, dec("4"));
    }

    #[test]
    fn zero_demand_yields_empty_plan() {
        let lots = vec![lot(2024, 1, 1, "3")];
        let plan = plan_fifo_deduction(&lots, Decimal::ZERO);

        assert!(plan.allocations.is_empty());
        assert!(plan.is_satisfied());
    }

    #[test]
    fn negative_demand_yields_empty_plan() {
        let lots = vec![lot(2024, 1, 1, "3")];
        let plan = plan_fifo_deduction(&lots, dec("-1"));

        assert!(plan.allocations.is_empty());
        assert!(plan.is_satisfied());
    }
}

// =============================================================================
// Property Tests
// =============================================================================

fn lot_strategy() -> impl Strategy<Value = BatchLot> {
    ((0u32..3650), (0u64..100_000)).prop_map(|(day, cents)| BatchLot {
        batch_date: date(2020, 1, 1) + chrono::Duration::days(day as i64),
        quantity: Decimal::new(cents as i64, 2),
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Deducted total plus shortfall always equals demand
    #[test]
    fn prop_demand_is_conserved(
        lots in prop::collection::vec(lot_strategy(), 0..10),
        demand_cents in 1u64..200_000
    ) {
        let demand = Decimal::new(demand_cents as i64, 2);
        let plan = plan_fifo_deduction(&lots, demand);
        prop_assert_eq!(plan.total_deducted() + plan.shortfall, demand);
    }

    /// No allocation deducts more than its lot held
    #[test]
    fn prop_never_overdraws_a_lot(
        lots in prop::collection::vec(lot_strategy(), 0..10),
        demand_cents in 1u64..200_000
    ) {
        let demand = Decimal::new(demand_cents as i64, 2);
        let plan = plan_fifo_deduction(&lots, demand);
        for alloc in &plan.allocations {
            prop_assert!(alloc.deducted <= lots[alloc.lot_index].quantity);
            prop_assert!(alloc.quantity_after >= Decimal::ZERO);
            prop_assert_eq!(
                alloc.quantity_before - alloc.deducted,
                alloc.quantity_after
            );
        }
    }

    /// Allocations come back in non-decreasing batch-date order
    #[test]
    fn prop_allocations_are_date_ordered(
        lots in prop::collection::vec(lot_strategy(), 0..10),
        demand_cents in 1u64..200_000
    ) {
        let demand = Decimal::new(demand_cents as i64, 2);
        let plan = plan_fifo_deduction(&lots, demand);
        for pair in plan.allocations.windows(2) {
            prop_assert!(pair[0].batch_date <= pair[1].batch_date);
        }
    }
}
