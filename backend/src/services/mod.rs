//! Business logic services for the Restaurant Inventory Management Platform

pub mod audit;
pub mod consumption;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod threshold;
pub mod transfer;
