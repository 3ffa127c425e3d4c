use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::asset::{Asset, AssetType};
use super::valuation::ValuationResult;

/// Sign of the profit/loss of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceStatus {
    Profit,
    Loss,
    BreakEven,
}

impl PerformanceStatus {
    pub fn from_profit_loss(profit_loss: Decimal) -> Self {
        if profit_loss > Decimal::ZERO {
            PerformanceStatus::Profit
        } else if profit_loss < Decimal::ZERO {
            PerformanceStatus::Loss
        } else {
            PerformanceStatus::BreakEven
        }
    }
}

impl std::fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceStatus::Profit => write!(f, "profit"),
            PerformanceStatus::Loss => write!(f, "loss"),
            PerformanceStatus::BreakEven => write!(f, "break-even"),
        }
    }
}

/// Performance of one asset against its cost basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    /// current value − total cost
    pub profit_loss: Decimal,

    /// profit_loss / total cost × 100; zero when the cost basis is zero
    pub profit_loss_percent: Decimal,

    /// Return on investment, identical to `profit_loss_percent`
    pub roi: Decimal,

    pub status: PerformanceStatus,

    /// Whole days since purchase, never below 1
    pub holding_period_days: i64,

    /// profit_loss_percent / (holding_period_days / 365)
    pub annualized_return: Decimal,

    /// Human-readable summary, e.g. "Your Bitcoin investment is up 20.00% 🎉"
    pub message: String,

    pub recommendation: String,

    /// Target price set and current unit price at or above it
    pub target_reached: bool,
}

/// Full performance report for a single asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPerformance {
    pub uuid: Uuid,
    pub name: String,
    pub asset_type: AssetType,
    pub symbol: Option<String>,

    // ── Investment ──────────────────────────────────────────────────
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: DateTime<Utc>,
    pub total_cost: Decimal,
    pub transaction_fee: Decimal,

    // ── Current value and metrics ───────────────────────────────────
    pub valuation: ValuationResult,
    pub performance: PerformanceResult,
    pub last_updated: DateTime<Utc>,
}

impl AssetPerformance {
    pub fn new(
        asset: &Asset,
        valuation: ValuationResult,
        performance: PerformanceResult,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: asset.uuid,
            name: asset.name.clone(),
            asset_type: asset.asset_type,
            symbol: asset.ticker(),
            quantity: asset.quantity,
            purchase_price: asset.purchase_price,
            purchase_date: asset.purchase_date,
            total_cost: asset.total_cost,
            transaction_fee: asset.transaction_fee.unwrap_or_default(),
            valuation,
            performance,
            last_updated,
        }
    }
}

/// Portfolio-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub total_invested: Decimal,
    pub current_value: Decimal,
    pub total_profit_loss: Decimal,
    pub total_profit_loss_percent: Decimal,
    /// Identical to `total_profit_loss_percent`
    pub total_roi: Decimal,
    pub currency: String,
    /// Evaluated assets left out of the totals because their valuation is in
    /// another currency
    pub excluded_assets: usize,
}

/// Aggregates for all non-planned assets of one type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub count: usize,
    pub total_invested: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    /// Share of the portfolio's current value, 0–100
    pub percentage: Decimal,
    pub roi: Decimal,
}

/// One row of the gainers/losers rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerSummary {
    pub uuid: Uuid,
    pub name: String,
    pub asset_type: AssetType,
    pub profit_loss_percent: Decimal,
    pub profit_loss: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopPerformers {
    /// Best first, only positive returns
    pub gainers: Vec<PerformerSummary>,
    /// Worst first, only negative returns
    pub losers: Vec<PerformerSummary>,
}

/// Asset counts by lifecycle status, planned assets included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub active: usize,
    pub sold: usize,
    pub planned: usize,
}

/// Performance of a user's whole portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    pub overview: PortfolioOverview,
    pub allocation: BTreeMap<AssetType, AllocationEntry>,
    pub top_performers: TopPerformers,
    pub status_summary: StatusSummary,
    pub last_updated: DateTime<Utc>,
}
