use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::valuation::{AssetValue, PortfolioValue, PriceSource, ValuationResult};
use crate::repository::AssetRepository;
use crate::services::valuation_service::ValuationService;

/// Values a user's assets, one at a time or the whole portfolio.
///
/// Portfolio valuation fans out one valuation per asset, at most
/// `max_concurrency` in flight, and only sums once every asset has
/// settled. A failing asset never fails the portfolio: it is listed at zero
/// with the `unavailable` source tag.
pub struct PortfolioService {
    assets: Arc<dyn AssetRepository>,
    valuation: Arc<ValuationService>,
    clock: Arc<dyn Clock>,
    max_concurrency: usize,
    default_currency: String,
}

impl PortfolioService {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        valuation: Arc<ValuationService>,
        clock: Arc<dyn Clock>,
        max_concurrency: usize,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            assets,
            valuation,
            clock,
            max_concurrency: max_concurrency.max(1),
            default_currency: default_currency.into(),
        }
    }

    pub fn valuation(&self) -> &ValuationService {
        &self.valuation
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Requested currency, uppercased; blank means the default currency.
    pub fn currency_or_default(&self, currency: &str) -> String {
        let trimmed = currency.trim();
        if trimmed.is_empty() {
            self.default_currency.clone()
        } else {
            trimmed.to_uppercase()
        }
    }

    /// Load one asset of `user_id`, `NotFound` when it is absent or owned by
    /// someone else.
    pub async fn find_asset(&self, user_id: i64, uuid: Uuid) -> Result<Asset, CoreError> {
        self.assets
            .get_by_uuid(uuid, user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("asset {uuid}")))
    }

    pub async fn list_assets(&self, user_id: i64) -> Result<Vec<Asset>, CoreError> {
        self.assets.list_by_user_id(user_id).await
    }

    /// Current value of a single asset. Resolver errors propagate.
    pub async fn get_asset_value(
        &self,
        user_id: i64,
        uuid: Uuid,
        currency: &str,
    ) -> Result<AssetValue, CoreError> {
        let asset = self.find_asset(user_id, uuid).await?;
        let currency = self.currency_or_default(currency);
        let valuation = self.valuation.resolve(&asset, &currency).await?;
        Ok(AssetValue::new(&asset, valuation, self.clock.now()))
    }

    /// Value every asset of `user_id` in `currency`.
    ///
    /// `total_value` only sums entries that ended up in `currency`; entries
    /// left in their own currency are listed unsummed.
    pub async fn get_portfolio_value(
        &self,
        user_id: i64,
        currency: &str,
    ) -> Result<PortfolioValue, CoreError> {
        let currency = self.currency_or_default(currency);
        let assets = self.assets.list_by_user_id(user_id).await?;
        let valuations = self.value_assets(&assets, &currency).await;
        let now = self.clock.now();

        let total_value: Decimal = valuations
            .iter()
            .filter(|v| v.currency == currency)
            .map(|v| v.total_value)
            .sum();

        let entries: Vec<AssetValue> = assets
            .iter()
            .zip(valuations)
            .map(|(asset, valuation)| AssetValue::new(asset, valuation, now))
            .collect();

        info!(
            user_id,
            assets = entries.len(),
            total = %total_value,
            currency = %currency,
            "portfolio valued"
        );

        Ok(PortfolioValue {
            user_id,
            currency,
            total_value,
            assets: entries,
            last_updated: now,
        })
    }

    /// Resolve every asset concurrently, in input order. Never fails: an
    /// asset whose resolution errors is valued at zero in `currency`.
    pub async fn value_assets(&self, assets: &[Asset], currency: &str) -> Vec<ValuationResult> {
        stream::iter(assets)
            .map(|asset| self.value_or_degrade(asset, currency))
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    async fn value_or_degrade(&self, asset: &Asset, currency: &str) -> ValuationResult {
        match self.valuation.resolve(asset, currency).await {
            Ok(valuation) => valuation,
            Err(e) => {
                warn!(asset = %asset.uuid, name = %asset.name, error = %e, "valuation failed, listing at zero");
                ValuationResult::zero(
                    asset.effective_quantity(),
                    currency,
                    PriceSource::Unavailable,
                )
            }
        }
    }
}
