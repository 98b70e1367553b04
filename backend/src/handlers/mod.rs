//! HTTP handlers for the Restaurant Inventory Management Platform

mod health;
mod inventory;
mod sales;
mod transfer;

pub use health::*;
pub use inventory::*;
pub use sales::*;
pub use transfer::*;
