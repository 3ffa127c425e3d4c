pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod log;
pub mod models;
pub mod providers;
pub mod repository;
pub mod services;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use cache::{MemoryCache, PriceCache};
use clock::{Clock, SystemClock};
use config::EngineConfig;
use errors::CoreError;
use models::{
    analytics::{AssetPerformance, PortfolioPerformance},
    asset::AssetType,
    chart::ChartSeries,
    price::{OhlcvCandle, PriceQuote},
    valuation::{AssetValue, PortfolioValue},
};
use providers::{
    coingecko::CoinGeckoProvider,
    traits::{CryptoQuoteProvider, MarketQuoteProvider},
    yahoo_finance::YahooFinanceProvider,
};
use repository::{AssetRepository, PriceHistoryRepository};
use services::{
    analytics_service::AnalyticsService,
    chart_service::{CryptoChartDays, StockChartInterval, StockChartRange},
    performance_service::PerformanceService,
    portfolio_service::PortfolioService,
    price_service::PriceService,
    valuation_service::ValuationService,
};

/// Main entry point of the valuation engine.
///
/// Holds the price client, the resolvers and the repositories it reads
/// from. Every operation takes `&self`, so one engine can be shared behind
/// an `Arc` by any number of concurrent requests.
#[must_use]
pub struct ValuationEngine {
    config: EngineConfig,
    cache: Arc<dyn PriceCache>,
    price_service: Arc<PriceService>,
    portfolio_service: Arc<PortfolioService>,
    analytics_service: AnalyticsService,
}

impl std::fmt::Debug for ValuationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationEngine")
            .field("default_currency", &self.config.default_currency)
            .field("cache", &self.cache.name())
            .field("max_concurrency", &self.config.max_concurrency)
            .finish()
    }
}

impl ValuationEngine {
    /// Build an engine against the real upstream APIs.
    ///
    /// Uses the shared redis cache when `redis_url` is configured, the
    /// in-process cache otherwise.
    pub async fn new(
        config: EngineConfig,
        assets: Arc<dyn AssetRepository>,
        history: Arc<dyn PriceHistoryRepository>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let client = providers::http_client(&config)?;
        let crypto = Arc::new(CoinGeckoProvider::from_config(client.clone(), &config));
        let market = Arc::new(YahooFinanceProvider::from_config(client, &config));
        let cache = Self::build_cache(&config).await?;

        Self::with_components(
            config,
            crypto,
            market,
            cache,
            assets,
            history,
            Arc::new(SystemClock),
        )
    }

    /// Build an engine from explicit parts (custom providers, cache, clock).
    pub fn with_components(
        config: EngineConfig,
        crypto: Arc<dyn CryptoQuoteProvider>,
        market: Arc<dyn MarketQuoteProvider>,
        cache: Arc<dyn PriceCache>,
        assets: Arc<dyn AssetRepository>,
        history: Arc<dyn PriceHistoryRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let price_service = Arc::new(PriceService::new(
            crypto,
            market,
            Arc::clone(&cache),
            &config,
        ));
        let valuation_service = Arc::new(ValuationService::new(
            Arc::clone(&price_service),
            history,
        ));
        let portfolio_service = Arc::new(PortfolioService::new(
            assets,
            valuation_service,
            Arc::clone(&clock),
            config.max_concurrency,
            config.currency_or_default(""),
        ));
        let analytics_service = AnalyticsService::new(
            Arc::clone(&portfolio_service),
            PerformanceService::with_clock(clock),
        );

        info!(
            cache = cache.name(),
            default_currency = %config.default_currency,
            "valuation engine ready"
        );

        Ok(Self {
            config,
            cache,
            price_service,
            portfolio_service,
            analytics_service,
        })
    }

    #[cfg(feature = "redis")]
    async fn build_cache(config: &EngineConfig) -> Result<Arc<dyn PriceCache>, CoreError> {
        match config.redis_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(Arc::new(cache::RedisCache::connect(url).await?)),
            _ => Ok(Arc::new(MemoryCache::new())),
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn build_cache(config: &EngineConfig) -> Result<Arc<dyn PriceCache>, CoreError> {
        if config.redis_url.is_some() {
            tracing::warn!("redis_url is set but the redis feature is disabled; using the memory cache");
        }
        Ok(Arc::new(MemoryCache::new()))
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the active cache backend ("memory" or "redis").
    #[must_use]
    pub fn cache_backend(&self) -> &str {
        self.cache.name()
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Current value of one asset of `user_id`.
    pub async fn get_asset_value(
        &self,
        user_id: i64,
        uuid: Uuid,
        currency: &str,
    ) -> Result<AssetValue, CoreError> {
        self.portfolio_service
            .get_asset_value(user_id, uuid, currency)
            .await
    }

    /// Current value of every asset of `user_id`. Single-asset failures
    /// degrade that entry instead of failing the call.
    pub async fn get_portfolio_value(
        &self,
        user_id: i64,
        currency: &str,
    ) -> Result<PortfolioValue, CoreError> {
        self.portfolio_service
            .get_portfolio_value(user_id, currency)
            .await
    }

    // ── Performance ─────────────────────────────────────────────────

    pub async fn get_asset_performance(
        &self,
        user_id: i64,
        uuid: Uuid,
        currency: &str,
    ) -> Result<AssetPerformance, CoreError> {
        self.analytics_service
            .get_asset_performance(user_id, uuid, currency)
            .await
    }

    pub async fn get_portfolio_performance(
        &self,
        user_id: i64,
        currency: &str,
    ) -> Result<PortfolioPerformance, CoreError> {
        self.analytics_service
            .get_portfolio_performance(user_id, currency)
            .await
    }

    // ── Charts ──────────────────────────────────────────────────────

    /// Crypto line chart over the last `days` days (1, 7, 14, 30 or 90).
    pub async fn get_crypto_chart(
        &self,
        symbol: &str,
        currency: &str,
        days: u32,
    ) -> Result<ChartSeries, CoreError> {
        let days = CryptoChartDays::try_from(days)?;
        self.price_service
            .get_crypto_chart(symbol, currency, days)
            .await
    }

    /// Stock close-price chart. Blank `range`/`interval` mean 1mo/1d.
    pub async fn get_stock_chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartSeries, CoreError> {
        let range: StockChartRange = range.parse()?;
        let interval: StockChartInterval = interval.parse()?;
        self.price_service
            .get_stock_chart(symbol, range, interval)
            .await
    }

    // ── Market data ─────────────────────────────────────────────────

    pub async fn get_price(
        &self,
        asset_type: AssetType,
        symbol: &str,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        self.price_service.get_price(asset_type, symbol, currency).await
    }

    pub async fn get_crypto_price(
        &self,
        symbol: &str,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        self.price_service.get_crypto_price(symbol, currency).await
    }

    pub async fn get_stock_price(
        &self,
        symbol: &str,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        self.price_service.get_stock_price(symbol, currency).await
    }

    pub async fn get_exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, CoreError> {
        self.price_service.get_exchange_rate(from, to).await
    }

    pub async fn get_historical_crypto_price(
        &self,
        symbol: &str,
        date: NaiveDate,
        currency: &str,
    ) -> Result<PriceQuote, CoreError> {
        self.price_service
            .get_historical_crypto_price(symbol, date, currency)
            .await
    }

    pub async fn get_crypto_ohlcv(
        &self,
        symbol: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<OhlcvCandle>, CoreError> {
        self.price_service
            .get_crypto_ohlcv(symbol, currency, days)
            .await
    }
}
