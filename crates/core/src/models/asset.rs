use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currency assumed when an asset was stored without a purchase currency.
pub const FALLBACK_ASSET_CURRENCY: &str = "USD";

/// Shares per lot on the Indonesia Stock Exchange.
pub const JAKARTA_LOT_SIZE: u32 = 100;

/// Tickers listed on the Indonesia Stock Exchange. Yahoo quotes them with a
/// `.JK` suffix and holdings are recorded in lots.
const JAKARTA_TICKERS: &[&str] = &[
    "BBRI", "BBCA", "BMRI", "BBNI", "BRIS", "TLKM", "ASII", "UNVR", "HMSP", "GGRM",
    "ICBP", "INDF", "KLBF", "PGAS", "SMGR", "ANTM", "PTBA", "ADRO", "ITMG", "INCO",
    "EXCL", "ISAT", "TOWR", "MNCN", "SIDO", "EMTK", "BUKA", "GOTO", "ACES", "MDKA",
];

/// The category of a tracked asset. Determines the valuation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    /// Priced live through the crypto quote provider.
    Crypto,
    /// Priced live through the equities quote provider.
    Stock,
    /// Bank balances and wallets; unit price 1 unless overridden.
    Cash,
    /// Valued from manual price records or the purchase price.
    RealEstate,
    /// Valued from manual price records or the purchase price.
    Livestock,
    Other,
}

impl AssetType {
    /// Whether the asset type is priced from a live market quote.
    pub fn is_market_priced(&self) -> bool {
        matches!(self, AssetType::Crypto | AssetType::Stock)
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Crypto => write!(f, "CRYPTO"),
            AssetType::Stock => write!(f, "STOCK"),
            AssetType::Cash => write!(f, "CASH"),
            AssetType::RealEstate => write!(f, "REAL_ESTATE"),
            AssetType::Livestock => write!(f, "LIVESTOCK"),
            AssetType::Other => write!(f, "OTHER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatus {
    Active,
    Sold,
    Planned,
}

/// An asset owned by a user, as stored by the asset repository.
///
/// Quantity and every monetary field are exact decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub name: String,
    pub asset_type: AssetType,
    /// Ticker (e.g., "BTC", "AAPL", "BBCA"). Only meaningful for market-priced types.
    #[serde(default)]
    pub symbol: Option<String>,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: DateTime<Utc>,
    #[serde(default)]
    pub purchase_currency: String,
    /// Total cost basis, fees included.
    pub total_cost: Decimal,
    #[serde(default)]
    pub transaction_fee: Option<Decimal>,
    #[serde(default)]
    pub target_price: Option<Decimal>,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<AssetStatus>,
    #[serde(default)]
    pub sold_price: Option<Decimal>,
    #[serde(default)]
    pub sold_date: Option<DateTime<Utc>>,
}

impl Asset {
    /// Create an active asset with a fresh UUID. Cost basis defaults to
    /// `quantity × purchase_price`.
    pub fn new(
        user_id: i64,
        name: impl Into<String>,
        asset_type: AssetType,
        quantity: Decimal,
        purchase_price: Decimal,
        purchase_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            uuid: Uuid::new_v4(),
            user_id,
            name: name.into(),
            asset_type,
            symbol: None,
            quantity,
            purchase_price,
            purchase_date,
            purchase_currency: String::new(),
            total_cost: quantity * purchase_price,
            transaction_fee: None,
            target_price: None,
            target_date: None,
            status: Some(AssetStatus::Active),
            sold_price: None,
            sold_date: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into().trim().to_uppercase());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.purchase_currency = currency.into().to_uppercase();
        self
    }

    pub fn with_total_cost(mut self, total_cost: Decimal) -> Self {
        self.total_cost = total_cost;
        self
    }

    pub fn with_target_price(mut self, target: Decimal) -> Self {
        self.target_price = Some(target);
        self
    }

    pub fn with_status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// The trimmed, uppercased ticker, or `None` when blank.
    pub fn ticker(&self) -> Option<String> {
        self.symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
    }

    /// Purchase currency, `USD` when the record has none.
    pub fn currency(&self) -> String {
        let trimmed = self.purchase_currency.trim();
        if trimmed.is_empty() {
            FALLBACK_ASSET_CURRENCY.to_string()
        } else {
            trimmed.to_uppercase()
        }
    }

    pub fn is_planned(&self) -> bool {
        self.status == Some(AssetStatus::Planned)
    }

    /// Number of units to price. Jakarta-listed stocks are held in lots of
    /// [`JAKARTA_LOT_SIZE`] shares; every other asset is held in units.
    pub fn effective_quantity(&self) -> Decimal {
        match (self.asset_type, self.ticker()) {
            (AssetType::Stock, Some(ticker)) if is_jakarta_ticker(&ticker) => {
                self.quantity * Decimal::from(JAKARTA_LOT_SIZE)
            }
            _ => self.quantity,
        }
    }
}

/// Whether a stock ticker trades on the Indonesia Stock Exchange, either as a
/// bare known ticker or already carrying the `.JK` suffix.
pub fn is_jakarta_ticker(symbol: &str) -> bool {
    let upper = symbol.trim().to_uppercase();
    upper.ends_with(".JK") || JAKARTA_TICKERS.contains(&upper.as_str())
}

/// Symbol as the equities provider expects it: known Jakarta tickers gain `.JK`.
pub fn provider_stock_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    if JAKARTA_TICKERS.contains(&upper.as_str()) {
        format!("{upper}.JK")
    } else {
        upper
    }
}
