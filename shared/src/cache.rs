//! Time-bounded cache
//!
//! Explicit TTL cache used by the threshold resolver. Reads take the current
//! instant as a parameter so expiry is testable without sleeping; callers in
//! the backend pass `Instant::now()`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A map whose entries expire a fixed TTL after insertion
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry as of `now`. Expired entries read as absent.
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let (inserted, value) = entries.get(key)?;
        if now.duration_since(*inserted) < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert a value stamped at `now`, replacing any previous entry.
    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, (now, value));
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// Drop one entry, forcing the next read to miss.
    pub fn invalidate(&self, key: &K) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}
