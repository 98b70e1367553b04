//! FIFO deduction planning
//!
//! Pure allocation core used when sales deduct stock: given the dated lots of
//! an ingredient and a quantity demand (already expressed in the inventory
//! unit), plan the per-batch deductions oldest-batch-first. The backend
//! executes the plan against the store and records one audit transaction per
//! allocation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One dated lot of an ingredient available for deduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchLot {
    pub batch_date: NaiveDate,
    pub quantity: Decimal,
}

/// A planned deduction against one lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Index into the caller's lot slice
    pub lot_index: usize,
    pub batch_date: NaiveDate,
    pub quantity_before: Decimal,
    pub deducted: Decimal,
    pub quantity_after: Decimal,
}

/// Result of planning a FIFO deduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub allocations: Vec<Allocation>,
    /// Demand left unsatisfied after every lot is exhausted
    pub shortfall: Decimal,
}

impl AllocationPlan {
    pub fn is_satisfied(&self) -> bool {
        self.shortfall.is_zero()
    }

    pub fn total_deducted(&self) -> Decimal {
        self.allocations.iter().map(|a| a.deducted).sum()
    }
}

/// Plan a FIFO deduction of `demand` across `lots`.
///
/// Lots are visited oldest `batch_date` first regardless of input order
/// (ties keep input order). Each lot gives up `min(lot quantity, remaining
/// demand)` until the demand is exhausted or the lots run out. Empty lots are
/// skipped. A non-positive demand yields an empty plan.
pub fn plan_fifo_deduction(lots: &[BatchLot], demand: Decimal) -> AllocationPlan {
    let mut plan = AllocationPlan {
        allocations: Vec::new(),
        shortfall: Decimal::ZERO,
    };
    if demand <= Decimal::ZERO {
        return plan;
    }

    let mut order: Vec<usize> = (0..lots.len()).collect();
    order.sort_by_key(|&i| lots[i].batch_date);

    let mut remaining = demand;
    for i in order {
        if remaining.is_zero() {
            break;
        }
        let lot = &lots[i];
        if lot.quantity <= Decimal::ZERO {
            continue;
        }
        let deducted = lot.quantity.min(remaining);
        plan.allocations.push(Allocation {
            lot_index: i,
            batch_date: lot.batch_date,
            quantity_before: lot.quantity,
            deducted,
            quantity_after: lot.quantity - deducted,
        });
        remaining -= deducted;
    }

    plan.shortfall = remaining;
    plan
}
