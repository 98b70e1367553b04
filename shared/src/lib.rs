//! Shared types and domain logic for the Restaurant Inventory Management Platform
//!
//! This crate contains the pure parts of the inventory lifecycle engine
//! (unit conversion, stock-status classification, FIFO allocation planning,
//! transfer planning, and trigger-time computation) shared between the
//! backend server and its test suites.

pub mod allocation;
pub mod cache;
pub mod models;
pub mod schedule;
pub mod transfer_plan;
pub mod units;
pub mod validation;

pub use allocation::*;
pub use models::*;
pub use schedule::*;
pub use transfer_plan::*;
pub use units::*;
pub use validation::*;
