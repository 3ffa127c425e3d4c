use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{self, CacheKey, PriceCache};
use crate::errors::CoreError;
use crate::models::price::PriceQuote;
use crate::providers::traits::MarketQuoteProvider;

/// Exchange rates between fiat currencies, cached like any other quote.
///
/// Rates come from the equities provider through the pair symbols it names
/// (`USDIDR=X` on Yahoo is the price of one USD in IDR). Converting a quote from
/// its native currency to the requested one is a single multiplication by
/// that rate.
pub struct CurrencyService {
    market: Arc<dyn MarketQuoteProvider>,
    cache: Arc<dyn PriceCache>,
    ttl: Duration,
}

impl CurrencyService {
    pub fn new(
        market: Arc<dyn MarketQuoteProvider>,
        cache: Arc<dyn PriceCache>,
        ttl: Duration,
    ) -> Self {
        Self { market, cache, ttl }
    }

    /// How many units of `to` one unit of `from` buys. Identical currencies
    /// (case-insensitive) have a rate of exactly 1 and never hit the network.
    pub async fn get_exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, CoreError> {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();
        if from.is_empty() || to.is_empty() {
            return Err(CoreError::Validation("currency code is required".into()));
        }
        if from == to {
            return Ok(Decimal::ONE);
        }

        let key = CacheKey::ExchangeRate {
            from: from.clone(),
            to: to.clone(),
        };
        if let Some(cached) = cache::get_json::<PriceQuote>(self.cache.as_ref(), &key).await {
            return Ok(cached.price);
        }

        let fx_symbol = self.market.fx_symbol(&from, &to);
        let quote = self.market.quote(&fx_symbol).await?;
        if quote.price <= Decimal::ZERO {
            return Err(CoreError::upstream(
                self.market.name(),
                format!("non-positive exchange rate for {fx_symbol}"),
            ));
        }

        let rate = PriceQuote {
            symbol: fx_symbol,
            price: quote.price,
            currency: to,
            source: self.market.name().to_string(),
            fetched_at: Utc::now(),
        };
        cache::set_json(self.cache.as_ref(), &key, &rate, self.ttl).await;
        info!(from = %from, rate = %rate.price, to = %rate.currency, "exchange_rate_fetched");
        Ok(rate.price)
    }

    /// Convert `amount` of `from` into `to`.
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, CoreError> {
        let rate = self.get_exchange_rate(from, to).await?;
        Ok(amount * rate)
    }
}
