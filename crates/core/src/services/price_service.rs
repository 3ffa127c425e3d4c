use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{self, CacheKey, PriceCache, DEFAULT_TTL};
use crate::config::EngineConfig;
use crate::errors::CoreError;
use crate::models::asset::{provider_stock_symbol, AssetType};
use crate::models::chart::ChartSeries;
use crate::models::price::{OhlcvCandle, PriceQuote};
use crate::providers::traits::{CryptoQuoteProvider, MarketQuoteProvider};
use crate::services::chart_service::{
    downsample, CryptoChartDays, StockChartInterval, StockChartRange,
};
use crate::services::currency_service::CurrencyService;

/// OHLCV look-back accepted by the crypto upstream, in days.
pub const MAX_OHLCV_DAYS: u32 = 365;

/// Turns (asset type, symbol, currency) into quotes and chart series.
///
/// Cache strategy:
/// - **Spot prices and FX rates**: cached for the configured price TTL.
/// - **Charts and OHLCV**: cached for the longer chart TTL, downsampled before storing.
/// - **Historical point prices**: cached for 24h; past prices do not move.
///
/// Symbols and currencies are uppercased before keys and upstream calls are
/// built. Upstream failures are returned as-is: no retries, no fallback
/// across providers. The one exception is FX: a stock quote whose currency
/// cannot be converted is returned in its native currency, uncached.
pub struct PriceService {
    crypto: Arc<dyn CryptoQuoteProvider>,
    market: Arc<dyn MarketQuoteProvider>,
    currency_service: CurrencyService,
    cache: Arc<dyn PriceCache>,
    price_ttl: Duration,
    chart_ttl: Duration,
    max_chart_points: usize,
    default_currency: String,
}

impl PriceService {
    pub fn new(
        crypto: Arc<dyn CryptoQuoteProvider>,
        market: Arc<dyn MarketQuoteProvider>,
        cache: Arc<dyn PriceCache>,
        config: &EngineConfig,
    ) -> Self {
        let currency_service =
            CurrencyService::new(Arc::clone(&market), Arc::clone(&cache), config.price_ttl());
        Self {
            crypto,
            market,
            currency_service,
            cache,
            price_ttl: config.price_ttl(),
            chart_ttl: config.chart_ttl(),
            max_chart_points: config.max_chart_points,
            default_currency: config.currency_or_default(""),
        }
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    fn currency_or_default(&self, currency: &str) -> String {
        let trimmed = currency.trim();
        if trimmed.is_empty() {
            self.default_currency.clone()
        } else {
            trimmed.to_uppercase()
        }
    }

    /// Latest quote for a market-priced asset type.
    ///
    /// Only crypto and stocks have quotes; any other type is `Unsupported`.
    pub async fn get_price(
        &self,
        asset_type: AssetType,
        symbol: &str,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        match asset_type {
            AssetType::Crypto => self.get_crypto_price(symbol, currency).await,
            AssetType::Stock => self.get_stock_price(symbol, currency).await,
            other => Err(CoreError::Unsupported(format!(
                "no price lookup for asset type {other}"
            ))),
        }
    }

    /// Spot price of a cryptocurrency, quoted directly in `currency`.
    pub async fn get_crypto_price(
        &self,
        symbol: &str,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let currency = self.currency_or_default(currency);
        if !self.crypto.supports(&symbol) {
            return Err(CoreError::UnsupportedSymbol(symbol));
        }

        let key = CacheKey::CryptoPrice {
            symbol: symbol.clone(),
            currency: currency.clone(),
        };
        if let Some(cached) = cache::get_json::<PriceQuote>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let price = self
            .crypto
            .spot_price(&symbol, &currency)
            .await
            .inspect_err(|e| warn!(symbol = %symbol, source = self.crypto.name(), error = %e, "price_api_error"))?;

        let quote = PriceQuote {
            symbol,
            price,
            currency,
            source: self.crypto.name().to_string(),
            fetched_at: Utc::now(),
        };
        cache::set_json(self.cache.as_ref(), &key, &quote, self.price_ttl).await;
        info!(symbol = %quote.symbol, price = %quote.price, source = %quote.source, "price_fetched");
        Ok(quote)
    }

    /// Latest price of a stock, converted into `currency` when its listing
    /// currency differs.
    ///
    /// Jakarta tickers are quoted upstream with their `.JK` suffix. When the
    /// FX rate is unavailable the quote comes back in the listing currency,
    /// so callers must check [`PriceQuote::currency`].
    pub async fn get_stock_price(
        &self,
        symbol: &str,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let currency = self.currency_or_default(currency);

        let key = CacheKey::StockPrice {
            symbol: symbol.clone(),
            currency: currency.clone(),
        };
        if let Some(cached) = cache::get_json::<PriceQuote>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let provider_symbol = provider_stock_symbol(&symbol);
        let native = self
            .market
            .quote(&provider_symbol)
            .await
            .inspect_err(|e| warn!(symbol = %provider_symbol, source = self.market.name(), error = %e, "price_api_error"))?;

        let mut quote = PriceQuote {
            symbol,
            price: native.price,
            currency: native.currency,
            source: self.market.name().to_string(),
            fetched_at: Utc::now(),
        };

        if quote.currency != currency {
            match self
                .currency_service
                .get_exchange_rate(&quote.currency, &currency)
                .await
            {
                Ok(rate) => {
                    quote.price *= rate;
                    quote.currency = currency;
                }
                Err(e) => {
                    warn!(
                        symbol = %quote.symbol,
                        from = %quote.currency,
                        to = %currency,
                        error = %e,
                        "fx_unavailable, returning quote in listing currency"
                    );
                    return Ok(quote);
                }
            }
        }

        cache::set_json(self.cache.as_ref(), &key, &quote, self.price_ttl).await;
        info!(symbol = %quote.symbol, price = %quote.price, source = %quote.source, "price_fetched");
        Ok(quote)
    }

    /// How many units of `to` one unit of `from` buys.
    pub async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Decimal, CoreError> {
        self.currency_service.get_exchange_rate(from, to).await
    }

    /// Price of a cryptocurrency on a past date (UTC).
    pub async fn get_historical_crypto_price(
        &self,
        symbol: &str,
        date: NaiveDate,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let currency = self.currency_or_default(currency);
        if !self.crypto.supports(&symbol) {
            return Err(CoreError::UnsupportedSymbol(symbol));
        }

        let key = CacheKey::CryptoHistory {
            symbol: symbol.clone(),
            currency: currency.clone(),
            date,
        };
        if let Some(cached) = cache::get_json::<PriceQuote>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let price = self
            .crypto
            .historical_price(&symbol, &currency, date)
            .await?;
        let quote = PriceQuote {
            symbol,
            price,
            currency,
            source: self.crypto.name().to_string(),
            fetched_at: date.and_time(NaiveTime::default()).and_utc(),
        };
        cache::set_json(self.cache.as_ref(), &key, &quote, DEFAULT_TTL).await;
        Ok(quote)
    }

    /// Daily-ish OHLC candles for the last `days` days, clamped to
    /// `1..=365`.
    pub async fn get_crypto_ohlcv(
        &self,
        symbol: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<OhlcvCandle>, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let currency = self.currency_or_default(currency);
        if !self.crypto.supports(&symbol) {
            return Err(CoreError::UnsupportedSymbol(symbol));
        }
        let days = days.clamp(1, MAX_OHLCV_DAYS);

        let key = CacheKey::CryptoOhlcv {
            symbol: symbol.clone(),
            currency: currency.clone(),
            days,
        };
        if let Some(cached) = cache::get_json::<Vec<OhlcvCandle>>(self.cache.as_ref(), &key).await
        {
            return Ok(cached);
        }

        let candles = self.crypto.ohlcv(&symbol, &currency, days).await?;
        cache::set_json(self.cache.as_ref(), &key, &candles, self.chart_ttl).await;
        Ok(candles)
    }

    /// Line chart of a cryptocurrency over the last `days` days, downsampled.
    pub async fn get_crypto_chart(
        &self,
        symbol: &str,
        currency: &str,
        days: CryptoChartDays,
    ) -> Result<ChartSeries, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let currency = self.currency_or_default(currency);
        if !self.crypto.supports(&symbol) {
            return Err(CoreError::UnsupportedSymbol(symbol));
        }

        let key = CacheKey::CryptoChart {
            symbol: symbol.clone(),
            currency: currency.clone(),
            days: days.days(),
        };
        if let Some(cached) = cache::get_json::<ChartSeries>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let raw = self
            .crypto
            .market_chart(&symbol, &currency, days.days())
            .await?;
        let series = ChartSeries {
            symbol,
            currency,
            data: downsample(&raw, self.max_chart_points),
        };
        cache::set_json(self.cache.as_ref(), &key, &series, self.chart_ttl).await;
        info!(symbol = %series.symbol, raw_points = raw.len(), points = series.data.len(), "chart_fetched");
        Ok(series)
    }

    /// Close-price chart of a stock in its listing currency, downsampled.
    pub async fn get_stock_chart(
        &self,
        symbol: &str,
        range: StockChartRange,
        interval: StockChartInterval,
    ) -> Result<ChartSeries, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let provider_symbol = provider_stock_symbol(&symbol);

        let key = CacheKey::StockChart {
            provider_symbol: provider_symbol.clone(),
            range: range.to_string(),
            interval: interval.to_string(),
        };
        if let Some(cached) = cache::get_json::<ChartSeries>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let chart = self
            .market
            .chart(&provider_symbol, range.as_str(), interval.as_str())
            .await?;
        let series = ChartSeries {
            symbol,
            currency: chart
                .currency
                .unwrap_or_else(|| self.default_currency.clone()),
            data: downsample(&chart.points, self.max_chart_points),
        };
        cache::set_json(self.cache.as_ref(), &key, &series, self.chart_ttl).await;
        info!(symbol = %provider_symbol, raw_points = chart.points.len(), points = series.data.len(), "chart_fetched");
        Ok(series)
    }
}

fn normalize_symbol(symbol: &str) -> Result<String, CoreError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(CoreError::Validation("symbol is required".into()));
    }
    Ok(symbol)
}
