use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::traits::{MarketChart, MarketQuote, MarketQuoteProvider};
use crate::config::{EngineConfig, DEFAULT_STOCK_API};
use crate::errors::{redact_query, CoreError};
use crate::models::chart::ChartPoint;
use crate::models::price::decimal_from_upstream;

const PROVIDER: &str = "yahoo_finance";

/// Yahoo Finance chart API provider for equities and FX rates.
///
/// - **Free**: No API key required (unofficial public API).
/// - **Coverage**: Global equities, ETFs, indices and currency pairs.
/// - **Endpoint**: `/v8/finance/chart/{symbol}?range=..&interval=..`
///
/// Quotes come back in the instrument's native currency (`meta.currency`).
/// FX rates use Yahoo's synthetic pair symbols, e.g. `USDIDR=X`.
pub struct YahooFinanceProvider {
    client: Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_STOCK_API.to_string(),
        }
    }

    pub fn from_config(client: Client, config: &EngineConfig) -> Self {
        Self::new(client).with_base_url(&config.stock_api_base)
    }

    /// Point the provider at another host (proxies, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch the first chart result for `symbol`.
    ///
    /// A `chart.error` body or an empty result list is `NotFound`; transport
    /// failures, other non-2xx statuses and malformed bodies are
    /// `UpstreamUnavailable`.
    async fn fetch_chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartItem, CoreError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, symbol, range, interval
        );
        debug!(provider = PROVIDER, url = %redact_query(&url), "upstream request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await
            .map_err(|e| {
                warn!(provider = PROVIDER, symbol, error = %redact_query(&e.to_string()), "price_api_error");
                CoreError::upstream(PROVIDER, redact_query(&e.to_string()))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::upstream(PROVIDER, redact_query(&e.to_string())))?;

        if !status.is_success() {
            warn!(provider = PROVIDER, symbol, status = status.as_u16(), "price_api_error");
            // Unknown symbols come back as 404 with a chart.error body.
            if status == StatusCode::NOT_FOUND {
                if let Ok(parsed) = serde_json::from_str::<ChartResponse>(&body) {
                    if let Some(err) = parsed.chart.error {
                        return Err(CoreError::NotFound(format!(
                            "{symbol}: {}",
                            err.description.unwrap_or(err.code)
                        )));
                    }
                }
            }
            return Err(CoreError::upstream(
                PROVIDER,
                format!("API returned status {status} for {symbol}"),
            ));
        }

        let parsed: ChartResponse = serde_json::from_str(&body)
            .map_err(|e| CoreError::upstream(PROVIDER, format!("malformed response: {e}")))?;

        if let Some(err) = parsed.chart.error {
            return Err(CoreError::NotFound(format!(
                "{symbol}: {}",
                err.description.unwrap_or(err.code)
            )));
        }

        parsed
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| CoreError::NotFound(format!("no chart data found for {symbol}")))
    }
}

#[async_trait]
impl MarketQuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    #[instrument(name = "YahooQuote", skip(self), fields(symbol = %provider_symbol))]
    async fn quote(&self, provider_symbol: &str) -> Result<MarketQuote, CoreError> {
        let item = self.fetch_chart(provider_symbol, "1d", "1d").await?;
        let price = item.meta.regular_market_price.ok_or_else(|| {
            CoreError::NotFound(format!("no market price for {provider_symbol}"))
        })?;
        let currency = item
            .meta
            .currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                CoreError::upstream(PROVIDER, format!("no currency reported for {provider_symbol}"))
            })?;

        Ok(MarketQuote {
            price: decimal_from_upstream(PROVIDER, price)?,
            currency,
        })
    }

    #[instrument(name = "YahooChart", skip(self), fields(symbol = %provider_symbol))]
    async fn chart(
        &self,
        provider_symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<MarketChart, CoreError> {
        let item = self.fetch_chart(provider_symbol, range, interval).await?;

        let currency = item
            .meta
            .currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());

        let timestamps = item.timestamp.unwrap_or_default();
        let closes = item
            .indicators
            .and_then(|ind| ind.quote.into_iter().next())
            .and_then(|q| q.close)
            .unwrap_or_default();

        if closes.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no quote data for {provider_symbol}"
            )));
        }

        // Yahoo pads missing sessions with nulls; those points are dropped.
        let points = timestamps
            .iter()
            .zip(closes.iter())
            .filter_map(|(t, close)| match close {
                Some(p) if p.is_finite() => Some(ChartPoint { t: *t, p: *p }),
                _ => None,
            })
            .collect();

        Ok(MarketChart { currency, points })
    }
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    close: Option<Vec<Option<f64>>>,
}
