//! Key/value price cache with per-entry TTL.
//!
//! Two backends satisfy the same [`PriceCache`] contract: [`MemoryCache`]
//! for a single process and `RedisCache` (feature `redis`) shared across
//! instances. The rest of the engine only sees `Arc<dyn PriceCache>`.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::CoreError;

pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;

/// TTL applied when a caller passes a zero TTL. Entries always expire.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Concurrent key/value store with per-entry expiry.
///
/// `get` returns `Ok(None)` on a miss (absent or expired), which callers can
/// tell apart from a stored empty value and from a backend failure.
#[async_trait]
pub trait PriceCache: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError>;

    /// Store `value` under `key`. A zero `ttl` is replaced by [`DEFAULT_TTL`].
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CoreError>;
}

/// Replace a zero TTL with the 24h default.
pub fn normalize_ttl(ttl: Duration) -> Duration {
    if ttl.is_zero() {
        DEFAULT_TTL
    } else {
        ttl
    }
}

/// Every cache key the engine writes. Each variant owns its own namespace,
/// so spot prices, FX rates and chart series never collide.
///
/// Symbols and currencies are expected uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CryptoPrice { symbol: String, currency: String },
    StockPrice { symbol: String, currency: String },
    ExchangeRate { from: String, to: String },
    CryptoHistory { symbol: String, currency: String, date: NaiveDate },
    CryptoOhlcv { symbol: String, currency: String, days: u32 },
    CryptoChart { symbol: String, currency: String, days: u32 },
    /// Keyed by the provider symbol (with any exchange suffix)
    StockChart { provider_symbol: String, range: String, interval: String },
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::CryptoPrice { symbol, currency } => {
                write!(f, "price:crypto:{symbol}:{currency}")
            }
            CacheKey::StockPrice { symbol, currency } => {
                write!(f, "price:stock:{symbol}:{currency}")
            }
            CacheKey::ExchangeRate { from, to } => write!(f, "fx:{from}:{to}"),
            CacheKey::CryptoHistory { symbol, currency, date } => {
                write!(f, "history:crypto:{symbol}:{currency}:{date}")
            }
            CacheKey::CryptoOhlcv { symbol, currency, days } => {
                write!(f, "ohlc:crypto:{symbol}:{currency}:{days}")
            }
            CacheKey::CryptoChart { symbol, currency, days } => {
                write!(f, "chart:crypto:{symbol}:{currency}:{days}")
            }
            CacheKey::StockChart { provider_symbol, range, interval } => {
                write!(f, "chart:stock:{provider_symbol}:{range}:{interval}")
            }
        }
    }
}

/// Read and decode a JSON entry. Backend errors and undecodable entries are
/// logged and reported as a miss so a broken cache never fails a lookup.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn PriceCache, key: &CacheKey) -> Option<T> {
    let key = key.to_string();
    let raw = match cache.get(&key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = %key, "cache_miss");
            return None;
        }
        Err(e) => {
            warn!(key = %key, backend = cache.name(), error = %e, "cache_read_failed");
            return None;
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(value) => {
            debug!(key = %key, "cache_hit");
            Some(value)
        }
        Err(e) => {
            warn!(key = %key, error = %e, "cache_entry_undecodable");
            None
        }
    }
}

/// Encode and store a JSON entry. Failures are logged and swallowed.
pub async fn set_json<T: Serialize>(
    cache: &dyn PriceCache,
    key: &CacheKey,
    value: &T,
    ttl: Duration,
) {
    let key = key.to_string();
    let raw = match serde_json::to_vec(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key = %key, error = %e, "cache_entry_unencodable");
            return;
        }
    };
    if let Err(e) = cache.set(&key, raw, ttl).await {
        warn!(key = %key, backend = cache.name(), error = %e, "cache_write_failed");
    }
}
