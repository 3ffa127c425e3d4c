use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::asset::{Asset, AssetType};
use crate::models::price::PriceHistoryRecord;
use crate::models::valuation::{PriceSource, ValuationResult};
use crate::repository::PriceHistoryRepository;
use crate::services::price_service::PriceService;

/// How an asset type is valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuationPolicy {
    /// Face value, or the latest recorded balance multiplier
    CashUnit,
    /// Latest recorded price, then purchase price, then zero
    ManualOrPurchase,
    /// Live market quote, purchase price on failure
    LiveQuote,
    /// No valuation semantics
    Unsupported,
}

impl ValuationPolicy {
    pub fn for_type(asset_type: AssetType) -> Self {
        match asset_type {
            AssetType::Cash => ValuationPolicy::CashUnit,
            AssetType::RealEstate | AssetType::Livestock => ValuationPolicy::ManualOrPurchase,
            AssetType::Crypto | AssetType::Stock => ValuationPolicy::LiveQuote,
            AssetType::Other => ValuationPolicy::Unsupported,
        }
    }
}

/// Decides the unit price and total value of a single asset.
///
/// Degrades instead of failing wherever a sane fallback exists. The only
/// error it returns is for a market-priced asset whose quote lookup failed
/// and which has no purchase price to fall back on.
pub struct ValuationService {
    prices: Arc<PriceService>,
    history: Arc<dyn PriceHistoryRepository>,
}

impl ValuationService {
    pub fn new(prices: Arc<PriceService>, history: Arc<dyn PriceHistoryRepository>) -> Self {
        Self { prices, history }
    }

    /// Value `asset` in `currency` (default currency when blank).
    ///
    /// Manually valued assets stay in their purchase currency; live quotes
    /// are in `currency` unless FX conversion was unavailable.
    pub async fn resolve(&self, asset: &Asset, currency: &str) -> Result<ValuationResult, CoreError> {
        let quantity = asset.effective_quantity();
        let asset_currency = asset.currency();

        let valuation = match ValuationPolicy::for_type(asset.asset_type) {
            ValuationPolicy::CashUnit => match self.latest_record(asset).await {
                Some(record) => ValuationResult::priced(
                    record.price,
                    quantity,
                    asset_currency,
                    PriceSource::ManualOverride,
                ),
                None => ValuationResult::priced(
                    Decimal::ONE,
                    quantity,
                    asset_currency,
                    PriceSource::CashUnit,
                ),
            },

            ValuationPolicy::ManualOrPurchase => match self.latest_record(asset).await {
                Some(record) => ValuationResult::priced(
                    record.price,
                    quantity,
                    asset_currency,
                    PriceSource::ManualOverride,
                ),
                None if !asset.purchase_price.is_zero() => ValuationResult::priced(
                    asset.purchase_price,
                    quantity,
                    asset_currency,
                    PriceSource::PurchasePriceFallback,
                ),
                None => ValuationResult::zero(quantity, asset_currency, PriceSource::Unavailable),
            },

            ValuationPolicy::LiveQuote => {
                let Some(symbol) = asset.ticker() else {
                    return Ok(ValuationResult::zero(
                        quantity,
                        asset_currency,
                        PriceSource::NoSymbol,
                    ));
                };
                match self.prices.get_price(asset.asset_type, &symbol, currency).await {
                    Ok(quote) => ValuationResult::priced(
                        quote.price,
                        quantity,
                        quote.currency,
                        PriceSource::ExternalLive,
                    ),
                    Err(e) if !asset.purchase_price.is_zero() => {
                        warn!(
                            asset = %asset.uuid,
                            symbol = %symbol,
                            error = %e,
                            "live price unavailable, valuing at purchase price"
                        );
                        ValuationResult::priced(
                            asset.purchase_price,
                            quantity,
                            asset_currency,
                            PriceSource::PurchasePriceFallback,
                        )
                    }
                    Err(e) => return Err(e),
                }
            }

            ValuationPolicy::Unsupported => {
                ValuationResult::zero(quantity, asset_currency, PriceSource::UnsupportedType)
            }
        };

        debug!(
            asset = %asset.uuid,
            source = %valuation.source,
            value = %valuation.total_value,
            currency = %valuation.currency,
            "asset valued"
        );
        Ok(valuation)
    }

    /// Latest recorded price. A failing history store counts as no record.
    async fn latest_record(&self, asset: &Asset) -> Option<PriceHistoryRecord> {
        match self.history.get_latest_by_asset_id(asset.id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(asset = %asset.uuid, error = %e, "price history lookup failed");
                None
            }
        }
    }
}
