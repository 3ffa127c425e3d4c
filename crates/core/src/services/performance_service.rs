use rust_decimal::Decimal;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::models::analytics::{PerformanceResult, PerformanceStatus};
use crate::models::asset::Asset;
use crate::models::valuation::ValuationResult;

const DAYS_PER_YEAR: i64 = 365;

/// Condition on profit/loss percent (or the target flag) selecting a
/// recommendation.
#[derive(Debug, Clone, Copy)]
enum Threshold {
    TargetReached,
    Above(i64),
    Below(i64),
}

/// First matching row wins.
const RECOMMENDATIONS: &[(Threshold, &str)] = &[
    (Threshold::TargetReached, "Target price reached! Consider taking profit."),
    (Threshold::Above(50), "Strong performance! Consider taking partial profits or rebalancing."),
    (Threshold::Above(20), "Good performance! Continue holding or consider your exit strategy."),
    (Threshold::Below(-20), "Significant loss. Review your investment thesis and consider cutting losses."),
    (Threshold::Below(-10), "Currently in loss. Hold if you believe in long-term prospects."),
];

const DEFAULT_RECOMMENDATION: &str = "Monitor regularly and stick to your investment plan.";

/// `part / whole × 100`, or zero when `whole` is zero or the result
/// does not fit in a decimal.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Profit/loss, ROI, holding period and advice for one valued asset.
pub struct PerformanceService {
    clock: Arc<dyn Clock>,
}

impl PerformanceService {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Evaluate `asset` against the value the resolver assigned to it.
    pub fn evaluate(&self, asset: &Asset, valuation: &ValuationResult) -> PerformanceResult {
        let profit_loss = valuation.total_value - asset.total_cost;
        let profit_loss_percent = percentage(profit_loss, asset.total_cost);
        let status = PerformanceStatus::from_profit_loss(profit_loss);

        let holding_period_days = self.holding_period_days(asset);
        let annualized_return = annualize(profit_loss_percent, holding_period_days);

        let target_reached = asset
            .target_price
            .is_some_and(|target| valuation.unit_price >= target);

        PerformanceResult {
            profit_loss,
            profit_loss_percent,
            roi: profit_loss_percent,
            status,
            holding_period_days,
            annualized_return,
            message: performance_message(&asset.name, profit_loss_percent, status),
            recommendation: recommendation(profit_loss_percent, target_reached).to_string(),
            target_reached,
        }
    }

    /// Whole days since purchase, at least 1.
    pub fn holding_period_days(&self, asset: &Asset) -> i64 {
        (self.clock.now() - asset.purchase_date).num_days().max(1)
    }
}

impl Default for PerformanceService {
    fn default() -> Self {
        Self::new()
    }
}

/// `percent / (days / 365)`; zero for a non-positive holding period.
fn annualize(percent: Decimal, days: i64) -> Decimal {
    if days <= 0 {
        return Decimal::ZERO;
    }
    percent
        .checked_mul(Decimal::from(DAYS_PER_YEAR))
        .and_then(|scaled| scaled.checked_div(Decimal::from(days)))
        .unwrap_or(Decimal::ZERO)
}

fn performance_message(name: &str, percent: Decimal, status: PerformanceStatus) -> String {
    let magnitude = percent.abs().round_dp(2);
    match status {
        PerformanceStatus::Profit => format!("Your {name} investment is up {magnitude:.2}% 🎉"),
        PerformanceStatus::Loss => format!("Your {name} investment is down {magnitude:.2}% 📉"),
        PerformanceStatus::BreakEven => format!("Your {name} investment is at break-even ⚪"),
    }
}

fn recommendation(percent: Decimal, target_reached: bool) -> &'static str {
    RECOMMENDATIONS
        .iter()
        .find(|(threshold, _)| match *threshold {
            Threshold::TargetReached => target_reached,
            Threshold::Above(bound) => percent > Decimal::from(bound),
            Threshold::Below(bound) => percent < Decimal::from(bound),
        })
        .map_or(DEFAULT_RECOMMENDATION, |(_, text)| *text)
}
