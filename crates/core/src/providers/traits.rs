use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::chart::ChartPoint;
use crate::models::price::OhlcvCandle;

/// Upstream family for cryptocurrency quotes and series.
///
/// Implementations own the ticker → provider-id mapping and return
/// [`CoreError::UnsupportedSymbol`] for tickers they cannot map. Symbols and
/// currencies arrive uppercased. Implementations never retry.
#[async_trait]
pub trait CryptoQuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Whether `symbol` has a known mapping.
    fn supports(&self, symbol: &str) -> bool;

    /// Latest price of `symbol` in `currency`.
    async fn spot_price(&self, symbol: &str, currency: &str) -> Result<Decimal, CoreError>;

    /// Price of `symbol` in `currency` on a past date.
    async fn historical_price(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, CoreError>;

    /// OHLC candles covering the last `days` days, oldest first.
    async fn ohlcv(
        &self,
        symbol: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<OhlcvCandle>, CoreError>;

    /// Raw price series over the last `days` days, oldest first.
    async fn market_chart(
        &self,
        symbol: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<ChartPoint>, CoreError>;
}

/// A quote from the equities/FX provider in the instrument's native currency.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketQuote {
    pub price: Decimal,
    /// Uppercased native currency reported by the upstream
    pub currency: String,
}

/// A chart from the equities provider. `currency` is `None` when the upstream
/// did not report one.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketChart {
    pub currency: Option<String>,
    pub points: Vec<ChartPoint>,
}

/// Upstream family for equities and FX quotes.
///
/// Takes provider symbols as-is: exchange suffixes (`BBCA.JK`) are built by
/// the caller, FX pair symbols by [`fx_symbol`](Self::fx_symbol).
#[async_trait]
pub trait MarketQuoteProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Provider symbol quoting one unit of `from` in `to`. Defaults to the
    /// Yahoo-style `USDIDR=X` form.
    fn fx_symbol(&self, from: &str, to: &str) -> String {
        format!("{}{}=X", from.to_uppercase(), to.to_uppercase())
    }

    /// Latest price and native currency of `provider_symbol`.
    async fn quote(&self, provider_symbol: &str) -> Result<MarketQuote, CoreError>;

    /// Close-price series for a Yahoo-style `range`/`interval` pair.
    async fn chart(
        &self,
        provider_symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<MarketChart, CoreError>;
}
