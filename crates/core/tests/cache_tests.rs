// ═══════════════════════════════════════════════════════════════════
// Cache Tests — MemoryCache contract, TTL, keys, JSON helpers, redis
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use wealth_valuation_core::cache::{
    self, normalize_ttl, CacheKey, MemoryCache, PriceCache, DEFAULT_TTL,
};
use wealth_valuation_core::errors::CoreError;
use wealth_valuation_core::models::price::PriceQuote;

fn quote() -> PriceQuote {
    PriceQuote {
        symbol: "BTC".into(),
        price: dec!(64250.12),
        currency: "USD".into(),
        source: "CoinGecko".into(),
        fetched_at: Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
    }
}

/// A backend that fails every call.
struct BrokenCache;

#[async_trait]
impl PriceCache for BrokenCache {
    fn name(&self) -> &str {
        "broken"
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        Err(CoreError::Cache("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CoreError> {
        Err(CoreError::Cache("connection refused".into()))
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryCache
// ═══════════════════════════════════════════════════════════════════

mod memory {
    use super::*;

    #[tokio::test]
    async fn miss_is_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("price:crypto:BTC:USD").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn empty_value_is_distinct_from_miss() {
        let cache = MemoryCache::new();
        cache.set("k", Vec::new(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new();
        cache.set("k", b"42".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"42".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = MemoryCache::new();
        cache.set("k", b"1".to_vec(), Duration::from_secs(60)).await.unwrap();
        cache.set("k", b"2".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = MemoryCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_millis(30)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_does_not_expire_immediately() {
        let cache = MemoryCache::new();
        cache.set("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test]
    async fn oversized_ttl_is_stored_not_a_panic() {
        let cache = MemoryCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_secs(u64::MAX)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn zero_ttl_normalizes_to_a_day() {
        assert_eq!(normalize_ttl(Duration::ZERO), DEFAULT_TTL);
        assert_eq!(DEFAULT_TTL, Duration::from_secs(86_400));
        assert_eq!(normalize_ttl(Duration::from_secs(5)), Duration::from_secs(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_and_writers() {
        let cache = Arc::new(MemoryCache::new());
        let mut handles = Vec::new();

        for writer in 0..8u8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for i in 0..50u8 {
                    let key = format!("w{writer}:{i}");
                    cache.set(&key, vec![writer, i], Duration::from_secs(60)).await.unwrap();
                }
            }));
        }
        for reader in 0..8u8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for i in 0..50u8 {
                    // Either a miss or the exact bytes the writer stored
                    if let Some(v) = cache.get(&format!("w{reader}:{i}")).await.unwrap() {
                        assert_eq!(v, vec![reader, i]);
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 8 * 50);
        assert_eq!(cache.get("w3:17").await.unwrap(), Some(vec![3, 17]));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Keys
// ═══════════════════════════════════════════════════════════════════

mod keys {
    use super::*;

    #[test]
    fn key_formats() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let cases = [
            (
                CacheKey::CryptoPrice { symbol: "BTC".into(), currency: "USD".into() },
                "price:crypto:BTC:USD",
            ),
            (
                CacheKey::StockPrice { symbol: "BBCA".into(), currency: "IDR".into() },
                "price:stock:BBCA:IDR",
            ),
            (CacheKey::ExchangeRate { from: "USD".into(), to: "IDR".into() }, "fx:USD:IDR"),
            (
                CacheKey::CryptoHistory { symbol: "BTC".into(), currency: "USD".into(), date },
                "history:crypto:BTC:USD:2025-01-15",
            ),
            (
                CacheKey::CryptoOhlcv { symbol: "BTC".into(), currency: "USD".into(), days: 30 },
                "ohlc:crypto:BTC:USD:30",
            ),
            (
                CacheKey::CryptoChart { symbol: "BTC".into(), currency: "USD".into(), days: 30 },
                "chart:crypto:BTC:USD:30",
            ),
            (
                CacheKey::StockChart {
                    provider_symbol: "BBCA.JK".into(),
                    range: "1mo".into(),
                    interval: "1d".into(),
                },
                "chart:stock:BBCA.JK:1mo:1d",
            ),
        ];
        for (key, expected) in cases {
            assert_eq!(key.to_string(), expected);
        }
    }

    #[test]
    fn namespaces_never_collide() {
        let price = CacheKey::CryptoPrice { symbol: "BTC".into(), currency: "USD".into() };
        let ohlc = CacheKey::CryptoOhlcv { symbol: "BTC".into(), currency: "USD".into(), days: 7 };
        let chart = CacheKey::CryptoChart { symbol: "BTC".into(), currency: "USD".into(), days: 7 };
        let stock = CacheKey::StockPrice { symbol: "BTC".into(), currency: "USD".into() };

        let keys: HashSet<String> =
            [&price, &ohlc, &chart, &stock].iter().map(|k| k.to_string()).collect();
        assert_eq!(keys.len(), 4);
    }
}

// ═══════════════════════════════════════════════════════════════════
// JSON helpers
// ═══════════════════════════════════════════════════════════════════

mod json_helpers {
    use super::*;

    fn key() -> CacheKey {
        CacheKey::CryptoPrice { symbol: "BTC".into(), currency: "USD".into() }
    }

    #[tokio::test]
    async fn stores_and_reads_typed_values() {
        let cache = MemoryCache::new();
        cache::set_json(&cache, &key(), &quote(), Duration::from_secs(60)).await;

        let cached: Option<PriceQuote> = cache::get_json(&cache, &key()).await;
        assert_eq!(cached, Some(quote()));
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache
            .set(&key().to_string(), b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        let cached: Option<PriceQuote> = cache::get_json(&cache, &key()).await;
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn broken_backend_degrades_to_miss() {
        let cache = BrokenCache;
        cache::set_json(&cache, &key(), &quote(), Duration::from_secs(60)).await;
        let cached: Option<PriceQuote> = cache::get_json(&cache, &key()).await;
        assert!(cached.is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Redis (needs a live server: REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored)
// ═══════════════════════════════════════════════════════════════════

#[cfg(feature = "redis")]
mod redis_backend {
    use super::*;
    use wealth_valuation_core::cache::RedisCache;

    #[tokio::test]
    #[ignore]
    async fn satisfies_the_cache_contract() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let cache = RedisCache::connect(&url).await.unwrap();
        let key = format!("test:{}", uuid::Uuid::new_v4());

        assert_eq!(cache.get(&key).await.unwrap(), None);
        cache.set(&key, b"v".to_vec(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(b"v".to_vec()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }
}
