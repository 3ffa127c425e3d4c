use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::traits::CryptoQuoteProvider;
use crate::config::{EngineConfig, DEFAULT_CRYPTO_API};
use crate::errors::{redact_query, CoreError};
use crate::models::chart::ChartPoint;
use crate::models::price::{decimal_from_upstream, OhlcvCandle};

const PROVIDER: &str = "coingecko";

/// CoinGecko v3 API provider for cryptocurrency prices.
///
/// - **Free**: works without a key; a demo key raises the rate limit.
/// - **Endpoints**: `/simple/price`, `/coins/{id}/history`, `/coins/{id}/ohlc`,
///   `/coins/{id}/market_chart`
///
/// CoinGecko addresses coins by id ("bitcoin"), not ticker. Tickers are
/// mapped through a fixed table; anything outside it is unsupported rather
/// than guessed.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_CRYPTO_API.to_string(),
            api_key: None,
        }
    }

    pub fn from_config(client: Client, config: &EngineConfig) -> Self {
        Self::new(client)
            .with_base_url(&config.crypto_api_base)
            .with_api_key(config.crypto_api_key.clone())
    }

    /// Point the provider at another host (proxies, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Map a ticker like "BTC" to a CoinGecko id like "bitcoin".
    pub fn coin_id(symbol: &str) -> Option<&'static str> {
        let id = match symbol.trim().to_uppercase().as_str() {
            "BTC" => "bitcoin",
            "ETH" => "ethereum",
            "SOL" => "solana",
            "USDT" => "tether",
            "USDC" => "usd-coin",
            "BNB" => "binancecoin",
            "XRP" => "ripple",
            "ADA" => "cardano",
            "DOGE" => "dogecoin",
            "AVAX" => "avalanche-2",
            "DOT" => "polkadot",
            "MATIC" | "POL" => "matic-network",
            "LINK" => "chainlink",
            "ATOM" => "cosmos",
            "UNI" => "uniswap",
            "LTC" => "litecoin",
            "TRX" => "tron",
            "SHIB" => "shiba-inu",
            "DAI" => "dai",
            "TON" => "the-open-network",
            _ => return None,
        };
        Some(id)
    }

    fn resolve(&self, symbol: &str) -> Result<&'static str, CoreError> {
        Self::coin_id(symbol).ok_or_else(|| CoreError::UnsupportedSymbol(symbol.to_uppercase()))
    }

    /// GET `{base_url}{path}` and decode the JSON body.
    ///
    /// A 404 (unknown coin id) is `NotFound`. Transport failures, 429 rate
    /// limits, other non-2xx statuses and undecodable bodies map to
    /// `UpstreamUnavailable`.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(provider = PROVIDER, url = %redact_query(&url), "upstream request");

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(provider = PROVIDER, error = %redact_query(&e.to_string()), "price_api_error");
            CoreError::upstream(PROVIDER, redact_query(&e.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(provider = PROVIDER, status = status.as_u16(), "price_api_error");
            if status == StatusCode::NOT_FOUND {
                return Err(CoreError::NotFound(format!("{PROVIDER}: {}", redact_query(path))));
            }
            return Err(CoreError::upstream(
                PROVIDER,
                format!("API returned status {status}"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CoreError::upstream(PROVIDER, format!("malformed response: {e}")))
    }
}

#[async_trait]
impl CryptoQuoteProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn supports(&self, symbol: &str) -> bool {
        Self::coin_id(symbol).is_some()
    }

    async fn spot_price(&self, symbol: &str, currency: &str) -> Result<Decimal, CoreError> {
        let id = self.resolve(symbol)?;
        let vs = currency.to_lowercase();

        // {"solana":{"usd":86.59}}
        let body: HashMap<String, HashMap<String, f64>> = self
            .get_json(&format!("/simple/price?ids={id}&vs_currencies={vs}"))
            .await?;

        let price = body
            .get(id)
            .and_then(|prices| prices.get(&vs))
            .ok_or_else(|| {
                CoreError::NotFound(format!("{} price in {}", symbol, currency.to_uppercase()))
            })?;

        decimal_from_upstream(PROVIDER, *price)
    }

    async fn historical_price(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, CoreError> {
        let id = self.resolve(symbol)?;
        let vs = currency.to_lowercase();
        let date_str = date.format("%d-%m-%Y");

        let body: CoinHistoryResponse = self
            .get_json(&format!(
                "/coins/{id}/history?date={date_str}&localization=false"
            ))
            .await?;

        let price = body
            .market_data
            .and_then(|m| m.current_price.get(&vs).copied())
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "{} price in {} on {}",
                    symbol,
                    currency.to_uppercase(),
                    date
                ))
            })?;

        decimal_from_upstream(PROVIDER, price)
    }

    async fn ohlcv(
        &self,
        symbol: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<OhlcvCandle>, CoreError> {
        let id = self.resolve(symbol)?;
        let vs = currency.to_lowercase();

        // [[timestamp_ms, open, high, low, close], ...]
        let rows: Vec<Vec<f64>> = self
            .get_json(&format!("/coins/{id}/ohlc?vs_currency={vs}&days={days}"))
            .await?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            let [ts, open, high, low, close] = match row.as_slice() {
                [ts, o, h, l, c, ..] => [*ts, *o, *h, *l, *c],
                _ => continue,
            };
            let Some(time_open) = DateTime::from_timestamp_millis(ts as i64) else {
                continue;
            };
            candles.push(OhlcvCandle {
                symbol: symbol.to_uppercase(),
                time_open,
                open: decimal_from_upstream(PROVIDER, open)?,
                high: decimal_from_upstream(PROVIDER, high)?,
                low: decimal_from_upstream(PROVIDER, low)?,
                close: decimal_from_upstream(PROVIDER, close)?,
                volume: Decimal::ZERO,
                currency: currency.to_uppercase(),
                source: self.name().to_string(),
            });
        }
        Ok(candles)
    }

    async fn market_chart(
        &self,
        symbol: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<ChartPoint>, CoreError> {
        let id = self.resolve(symbol)?;
        let vs = currency.to_lowercase();

        let body: MarketChartResponse = self
            .get_json(&format!(
                "/coins/{id}/market_chart?vs_currency={vs}&days={days}"
            ))
            .await?;

        Ok(body
            .prices
            .iter()
            .filter_map(|pair| match pair.as_slice() {
                [ms, price, ..] if price.is_finite() => Some(ChartPoint {
                    t: (*ms as i64) / 1000,
                    p: *price,
                }),
                _ => None,
            })
            .collect())
    }
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CoinHistoryResponse {
    /// Absent for dates before the coin was listed
    market_data: Option<HistoryMarketData>,
}

#[derive(Debug, Deserialize)]
struct HistoryMarketData {
    current_price: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<Vec<f64>>,
}
