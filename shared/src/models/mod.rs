//! Domain models for the Restaurant Inventory Management Platform

mod collection;
mod status;

pub use collection::*;
pub use status::*;
