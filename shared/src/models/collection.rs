//! Inventory life-stage collections
//!
//! A batch belongs to exactly one collection. Master, Today and Surplus share
//! the same shape and the `(item_id, batch_date)` uniqueness key; Spoilage is
//! append-only. Each of the three active collections has an archived shadow
//! table for depleted batches.

use serde::{Deserialize, Serialize};

/// Life-stage of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Master,
    Today,
    Surplus,
    Spoilage,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Master => "master",
            Collection::Today => "today",
            Collection::Surplus => "surplus",
            Collection::Spoilage => "spoilage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "master" => Some(Collection::Master),
            "today" => Some(Collection::Today),
            "surplus" => Some(Collection::Surplus),
            "spoilage" => Some(Collection::Spoilage),
            _ => None,
        }
    }

    /// Physical table backing this collection
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Master => "master_batches",
            Collection::Today => "today_batches",
            Collection::Surplus => "surplus_batches",
            Collection::Spoilage => "spoilage_batches",
        }
    }

    /// Archived shadow table, where depleted batches are moved.
    /// Spoilage is append-only and has no shadow.
    pub fn archived_table(&self) -> Option<&'static str> {
        match self {
            Collection::Master => Some("archived_master_batches"),
            Collection::Today => Some("archived_today_batches"),
            Collection::Surplus => Some("archived_surplus_batches"),
            Collection::Spoilage => None,
        }
    }

    /// The three collections scanned for expired batches
    pub fn active() -> [Collection; 3] {
        [Collection::Master, Collection::Today, Collection::Surplus]
    }
}
