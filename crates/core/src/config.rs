use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;

pub const DEFAULT_CURRENCY: &str = "IDR";
pub const DEFAULT_CRYPTO_API: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_STOCK_API: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_PRICE_TTL_SECS: u64 = 60;
pub const DEFAULT_CHART_TTL_SECS: u64 = 15 * 60;
pub const DEFAULT_MAX_CHART_POINTS: usize = 200;
/// Longest cache lifetime a configuration may ask for (one year).
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Engine settings: upstream endpoints, cache lifetimes, timeouts and the
/// per-portfolio concurrency limit.
///
/// Every field has a default, so an empty TOML document or an empty
/// environment yields a working configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency used when a caller passes none
    pub default_currency: String,

    /// Base URL of the CoinGecko v3 API
    pub crypto_api_base: String,

    /// Optional CoinGecko demo key, sent as `x-cg-demo-api-key`
    pub crypto_api_key: Option<String>,

    /// Base URL of the Yahoo Finance chart API
    pub stock_api_base: String,

    /// Lifetime of spot prices and FX rates in the cache
    pub price_ttl_secs: u64,

    /// Lifetime of chart and OHLCV series in the cache
    pub chart_ttl_secs: u64,

    /// Upper bound on points returned by chart operations
    pub max_chart_points: usize,

    /// Total per-request timeout for upstream calls
    pub request_timeout_secs: u64,

    /// Connect timeout for upstream calls
    pub connect_timeout_secs: u64,

    /// Assets valued concurrently within one portfolio request
    pub max_concurrency: usize,

    /// Shared cache location. In-process memory cache when unset.
    pub redis_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
            crypto_api_base: DEFAULT_CRYPTO_API.to_string(),
            crypto_api_key: None,
            stock_api_base: DEFAULT_STOCK_API.to_string(),
            price_ttl_secs: DEFAULT_PRICE_TTL_SECS,
            chart_ttl_secs: DEFAULT_CHART_TTL_SECS,
            max_chart_points: DEFAULT_MAX_CHART_POINTS,
            request_timeout_secs: 15,
            connect_timeout_secs: 10,
            max_concurrency: 8,
            redis_url: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from process environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = EngineConfig::default();

        if let Some(v) = get("DEFAULT_CURRENCY") {
            config.default_currency = v.to_uppercase();
        }
        if let Some(v) = get("CRYPTO_PRICE_API") {
            config.crypto_api_base = v;
        }
        config.crypto_api_key = get("CRYPTO_API_KEY");
        if let Some(v) = get("STOCK_PRICE_API") {
            config.stock_api_base = v;
        }
        if let Some(v) = get("PRICE_CACHE_TTL") {
            config.price_ttl_secs = parse_var("PRICE_CACHE_TTL", &v)?;
        }
        if let Some(v) = get("CHART_CACHE_TTL") {
            config.chart_ttl_secs = parse_var("CHART_CACHE_TTL", &v)?;
        }
        if let Some(v) = get("MAX_CHART_POINTS") {
            config.max_chart_points = parse_var("MAX_CHART_POINTS", &v)?;
        }
        if let Some(v) = get("VALUATION_CONCURRENCY") {
            config.max_concurrency = parse_var("VALUATION_CONCURRENCY", &v)?;
        }
        config.redis_url = get("REDIS_URL");

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.default_currency.trim().is_empty() {
            return Err(CoreError::Config("default_currency must not be empty".into()));
        }
        if self.max_concurrency == 0 {
            return Err(CoreError::Config("max_concurrency must be at least 1".into()));
        }
        if self.max_chart_points == 0 {
            return Err(CoreError::Config("max_chart_points must be at least 1".into()));
        }
        if self.price_ttl_secs > MAX_CACHE_TTL_SECS || self.chart_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(CoreError::Config(format!(
                "cache TTLs must not exceed {MAX_CACHE_TTL_SECS} seconds"
            )));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(CoreError::Config("timeouts must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Spot price TTL; a zero setting falls back to 60 seconds.
    pub fn price_ttl(&self) -> Duration {
        if self.price_ttl_secs == 0 {
            Duration::from_secs(DEFAULT_PRICE_TTL_SECS)
        } else {
            Duration::from_secs(self.price_ttl_secs)
        }
    }

    pub fn chart_ttl(&self) -> Duration {
        Duration::from_secs(self.chart_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// `currency` uppercased, or the default currency when blank.
    pub fn currency_or_default(&self, currency: &str) -> String {
        let trimmed = currency.trim();
        if trimmed.is_empty() {
            self.default_currency.to_uppercase()
        } else {
            trimmed.to_uppercase()
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, CoreError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| CoreError::Config(format!("{name}={value:?}: {e}")))
}
