//! Threshold resolver
//!
//! Looks up the configured low-stock threshold (and inventory unit) for an
//! item name, behind a TTL cache. Lookup failures and missing rows fall back
//! to the configured default so the classifier can always run, but the
//! fallback is logged at WARN: a permanently defaulted threshold can mask a
//! real shortage, and that must be visible in the logs.

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;

use shared::cache::TtlCache;

use crate::services::store::BatchStore;

/// Resolved threshold data for one item
#[derive(Debug, Clone)]
pub struct ResolvedThreshold {
    pub threshold: Decimal,
    /// Inventory unit recipes convert into; None when no row is configured
    pub default_unit: Option<String>,
    /// True when the value is the system default, not a configured row
    pub is_fallback: bool,
}

/// Threshold resolver with a process-wide TTL cache.
/// Constructed once at startup and shared through `AppState`.
pub struct ThresholdResolver {
    store: BatchStore,
    cache: TtlCache<String, ResolvedThreshold>,
    default_threshold: Decimal,
}

impl ThresholdResolver {
    pub fn new(db: PgPool, default_threshold: Decimal, cache_ttl: Duration) -> Self {
        Self {
            store: BatchStore::new(db),
            cache: TtlCache::new(cache_ttl),
            default_threshold,
        }
    }

    /// Resolve the threshold for an item name. Never fails: persistence
    /// errors are swallowed and the default returned.
    pub async fn resolve(&self, item_name: &str) -> ResolvedThreshold {
        let key = item_name.trim().to_lowercase();

        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let resolved = match self.store.threshold_setting(&key).await {
            Ok(Some(setting)) => ResolvedThreshold {
                threshold: setting.low_stock_threshold,
                default_unit: setting.default_unit,
                is_fallback: false,
            },
            Ok(None) => {
                tracing::warn!(
                    item_name = %key,
                    default = %self.default_threshold,
                    "no threshold configured for item, using system default"
                );
                self.fallback()
            }
            Err(e) => {
                tracing::warn!(
                    item_name = %key,
                    error = %e,
                    "threshold lookup failed, using system default"
                );
                self.fallback()
            }
        };

        self.cache.insert(key, resolved.clone());
        resolved
    }

    /// Threshold only, for callers that do not need the unit
    pub async fn threshold_for(&self, item_name: &str) -> Decimal {
        self.resolve(item_name).await.threshold
    }

    fn fallback(&self) -> ResolvedThreshold {
        ResolvedThreshold {
            threshold: self.default_threshold,
            default_unit: None,
            is_fallback: true,
        }
    }
}
