use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::{Asset, AssetType};

/// Which pricing policy produced a valuation.
///
/// Always present on output so callers can tell authoritative values from
/// degraded ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    /// Live quote from an upstream market data provider
    ExternalLive,
    /// Latest manually recorded price history entry
    ManualOverride,
    /// Purchase price, used when no better price exists
    PurchasePriceFallback,
    /// Cash held at face value (unit price 1)
    CashUnit,
    /// Asset type without valuation semantics
    UnsupportedType,
    /// Market-priced asset without a ticker
    NoSymbol,
    /// Nothing to price the asset with; valued at zero
    Unavailable,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::ExternalLive => "external-live",
            PriceSource::ManualOverride => "manual-override",
            PriceSource::PurchasePriceFallback => "purchase-price-fallback",
            PriceSource::CashUnit => "cash-unit",
            PriceSource::UnsupportedType => "unsupported-type",
            PriceSource::NoSymbol => "no-symbol",
            PriceSource::Unavailable => "unavailable",
        }
    }

    /// Whether the value comes from a live market quote.
    pub fn is_live(&self) -> bool {
        matches!(self, PriceSource::ExternalLive)
    }
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved current value of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Price per unit in `currency`
    pub unit_price: Decimal,

    /// `effective_quantity × unit_price`
    pub total_value: Decimal,

    /// Currency of `unit_price` and `total_value`
    pub currency: String,

    /// Policy that produced this valuation
    pub source: PriceSource,

    /// Units priced (lots converted to shares for Jakarta stocks)
    pub effective_quantity: Decimal,
}

impl ValuationResult {
    pub fn priced(
        unit_price: Decimal,
        effective_quantity: Decimal,
        currency: impl Into<String>,
        source: PriceSource,
    ) -> Self {
        Self {
            unit_price,
            total_value: effective_quantity * unit_price,
            currency: currency.into(),
            source,
            effective_quantity,
        }
    }

    /// A zero valuation carrying only its reason.
    pub fn zero(
        effective_quantity: Decimal,
        currency: impl Into<String>,
        source: PriceSource,
    ) -> Self {
        Self::priced(Decimal::ZERO, effective_quantity, currency, source)
    }
}

/// Valuation of a single asset together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetValue {
    pub uuid: Uuid,
    pub name: String,
    pub asset_type: AssetType,
    pub symbol: Option<String>,
    /// Quantity as stored (lots for Jakarta stocks)
    pub quantity: Decimal,
    pub valuation: ValuationResult,
    pub last_updated: DateTime<Utc>,
}

impl AssetValue {
    pub fn new(asset: &Asset, valuation: ValuationResult, last_updated: DateTime<Utc>) -> Self {
        Self {
            uuid: asset.uuid,
            name: asset.name.clone(),
            asset_type: asset.asset_type,
            symbol: asset.ticker(),
            quantity: asset.quantity,
            valuation,
            last_updated,
        }
    }
}

/// Every asset of a user valued in one requested currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValue {
    pub user_id: i64,

    /// Requested currency
    pub currency: String,

    /// Sum of the entries valued in `currency`. Entries left in another
    /// currency (no FX conversion available) are listed but not summed.
    pub total_value: Decimal,

    /// One entry per asset, in repository order
    pub assets: Vec<AssetValue>,

    pub last_updated: DateTime<Utc>,
}
