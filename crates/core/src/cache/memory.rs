use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{normalize_ttl, PriceCache, DEFAULT_TTL};
use crate::errors::CoreError;

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process cache guarded by a read/write lock.
///
/// Readers share the lock; writers take it exclusively. The lock is never
/// held across an `.await`, so a plain `std::sync::RwLock` is enough.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "memory cache purged expired entries");
        }
        removed
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceCache for MemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CoreError> {
        let now = Instant::now();
        // A TTL past what `Instant` can represent gets the default lifetime.
        let expires_at = now
            .checked_add(normalize_ttl(ttl))
            .or_else(|| now.checked_add(DEFAULT_TTL))
            .unwrap_or(now);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }
}
