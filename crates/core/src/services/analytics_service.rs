use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::analytics::{
    AllocationEntry, AssetPerformance, PerformerSummary, PortfolioOverview, PortfolioPerformance,
    StatusSummary, TopPerformers,
};
use crate::models::asset::{Asset, AssetStatus, AssetType};
use crate::services::performance_service::{percentage, PerformanceService};
use crate::services::portfolio_service::PortfolioService;

/// Entries kept in each of the gainers and losers rankings.
pub const TOP_PERFORMERS_LIMIT: usize = 5;

/// Computes performance: profit/loss, returns, allocation breakdown and
/// rankings.
///
/// Planned assets are counted in the status summary but never valued, so
/// they stay out of every monetary aggregate.
pub struct AnalyticsService {
    portfolio: Arc<PortfolioService>,
    performance: PerformanceService,
}

impl AnalyticsService {
    pub fn new(portfolio: Arc<PortfolioService>, performance: PerformanceService) -> Self {
        Self {
            portfolio,
            performance,
        }
    }

    /// Performance of one asset. A blank `currency` values the asset in its
    /// own purchase currency, so profit/loss compares like with like.
    pub async fn get_asset_performance(
        &self,
        user_id: i64,
        uuid: Uuid,
        currency: &str,
    ) -> Result<AssetPerformance, CoreError> {
        let asset = self.portfolio.find_asset(user_id, uuid).await?;
        let currency = if currency.trim().is_empty() {
            asset.currency()
        } else {
            currency.trim().to_uppercase()
        };

        let valuation = self.portfolio.valuation().resolve(&asset, &currency).await?;
        let performance = self.performance.evaluate(&asset, &valuation);
        Ok(AssetPerformance::new(
            &asset,
            valuation,
            performance,
            self.performance.clock().now(),
        ))
    }

    /// Performance of the whole portfolio of `user_id`.
    pub async fn get_portfolio_performance(
        &self,
        user_id: i64,
        currency: &str,
    ) -> Result<PortfolioPerformance, CoreError> {
        let currency = self.portfolio.currency_or_default(currency);
        let assets = self.portfolio.list_assets(user_id).await?;
        let now = self.performance.clock().now();

        let held: Vec<Asset> = assets.iter().filter(|a| !a.is_planned()).cloned().collect();
        let valuations = self.portfolio.value_assets(&held, &currency).await;

        let evaluated: Vec<AssetPerformance> = held
            .iter()
            .zip(valuations)
            .map(|(asset, valuation)| {
                let performance = self.performance.evaluate(asset, &valuation);
                AssetPerformance::new(asset, valuation, performance, now)
            })
            .collect();

        let report = aggregate(&assets, &evaluated, &currency, now);
        info!(
            user_id,
            assets = assets.len(),
            valued = evaluated.len(),
            excluded = report.overview.excluded_assets,
            value = %report.overview.current_value,
            currency = %currency,
            "portfolio performance computed"
        );
        Ok(report)
    }
}

/// Fold evaluated assets into portfolio totals, allocation, rankings and
/// status counts.
///
/// `assets` feeds the status counts only; `evaluated` holds the non-planned
/// assets with their valuation and performance. Only entries valued in
/// `currency` reach the totals, allocation and rankings, matching the
/// portfolio value sum; the rest are counted in `excluded_assets`.
/// Allocation shares are computed in a second pass, once the portfolio total
/// is known.
pub fn aggregate(
    assets: &[Asset],
    evaluated: &[AssetPerformance],
    currency: &str,
    now: DateTime<Utc>,
) -> PortfolioPerformance {
    let status_summary = count_statuses(assets);

    let mut overview = PortfolioOverview {
        currency: currency.to_string(),
        ..Default::default()
    };
    let mut allocation: BTreeMap<AssetType, AllocationEntry> = BTreeMap::new();

    let (comparable, excluded): (Vec<&AssetPerformance>, Vec<&AssetPerformance>) = evaluated
        .iter()
        .partition(|entry| entry.valuation.currency == currency);
    overview.excluded_assets = excluded.len();

    for entry in &comparable {
        let current_value = entry.valuation.total_value;
        let profit_loss = entry.performance.profit_loss;

        overview.total_invested += entry.total_cost;
        overview.current_value += current_value;
        overview.total_profit_loss += profit_loss;

        let slot = allocation.entry(entry.asset_type).or_default();
        slot.count += 1;
        slot.total_invested += entry.total_cost;
        slot.current_value += current_value;
        slot.profit_loss += profit_loss;
    }

    overview.total_profit_loss_percent =
        percentage(overview.total_profit_loss, overview.total_invested);
    overview.total_roi = overview.total_profit_loss_percent;

    for slot in allocation.values_mut() {
        slot.percentage = percentage(slot.current_value, overview.current_value);
        slot.roi = percentage(slot.profit_loss, slot.total_invested);
    }

    PortfolioPerformance {
        overview,
        allocation,
        top_performers: rank_performers(&comparable),
        status_summary,
        last_updated: now,
    }
}

fn count_statuses(assets: &[Asset]) -> StatusSummary {
    let mut summary = StatusSummary::default();
    for asset in assets {
        // A record without a status is a held asset.
        match asset.status.unwrap_or(AssetStatus::Active) {
            AssetStatus::Active => summary.active += 1,
            AssetStatus::Sold => summary.sold += 1,
            AssetStatus::Planned => summary.planned += 1,
        }
    }
    summary
}

/// Top gainers (best first) and losers (worst first) by profit/loss
/// percent. Ties keep portfolio order.
fn rank_performers(evaluated: &[&AssetPerformance]) -> TopPerformers {
    let mut ranked: Vec<PerformerSummary> = evaluated
        .iter()
        .map(|entry| PerformerSummary {
            uuid: entry.uuid,
            name: entry.name.clone(),
            asset_type: entry.asset_type,
            profit_loss_percent: entry.performance.profit_loss_percent,
            profit_loss: entry.performance.profit_loss,
        })
        .collect();
    ranked.sort_by(|a, b| b.profit_loss_percent.cmp(&a.profit_loss_percent));

    let gainers = ranked
        .iter()
        .take_while(|p| p.profit_loss_percent > Decimal::ZERO)
        .take(TOP_PERFORMERS_LIMIT)
        .cloned()
        .collect();
    let losers = ranked
        .iter()
        .rev()
        .take_while(|p| p.profit_loss_percent < Decimal::ZERO)
        .take(TOP_PERFORMERS_LIMIT)
        .cloned()
        .collect();

    TopPerformers { gainers, losers }
}
