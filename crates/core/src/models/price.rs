use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A single upstream-reported price for a symbol in a currency.
///
/// Ephemeral: created per lookup and only ever persisted in the price cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Uppercased ticker as requested by the caller (e.g., "BTC", "BBCA")
    pub symbol: String,

    /// Price per unit in `currency`
    pub price: Decimal,

    /// Currency of `price`. May differ from the requested currency when an
    /// FX conversion could not be performed.
    pub currency: String,

    /// Upstream that produced the quote (e.g., "CoinGecko", "Yahoo Finance")
    pub source: String,

    /// When the quote was fetched from the upstream
    pub fetched_at: DateTime<Utc>,
}

/// One OHLC candle. CoinGecko does not report volume, so it is zero there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvCandle {
    pub symbol: String,
    pub time_open: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub currency: String,
    pub source: String,
}

/// A manually recorded price for an asset, persisted by an external store.
///
/// The most recent record is authoritative over the purchase price for
/// assets without a live quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryRecord {
    pub id: i64,
    pub asset_id: i64,
    pub price: Decimal,
    /// Free-form origin, e.g. "manual", "appraisal", "coingecko"
    pub source: String,
    pub recorded_at: DateTime<Utc>,
}

impl PriceHistoryRecord {
    pub fn new(asset_id: i64, price: Decimal, source: impl Into<String>) -> Self {
        Self {
            id: 0,
            asset_id,
            price,
            source: source.into(),
            recorded_at: Utc::now(),
        }
    }

    /// Reject records that could never be a valid unit price.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.price <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        if self.source.trim().is_empty() {
            return Err(CoreError::Validation("price source is required".into()));
        }
        Ok(())
    }
}

/// Convert an upstream float price into an exact decimal, exactly once.
///
/// Goes through the shortest round-trip text form so `86.59` stays `86.59`
/// instead of picking up binary noise. Non-finite and negative prices are
/// rejected as a malformed upstream response.
pub fn decimal_from_upstream(provider: &str, value: f64) -> Result<Decimal, CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::upstream(
            provider,
            format!("invalid price {value} (must be finite and non-negative)"),
        ));
    }
    value
        .to_string()
        .parse::<Decimal>()
        .map_err(|e| CoreError::upstream(provider, format!("price {value} out of range: {e}")))
}
