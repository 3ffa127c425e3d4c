use serde::{Deserialize, Serialize};

/// One point of a line chart.
///
/// Chart prices are for rendering only; no arithmetic is done on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Unix timestamp in seconds
    pub t: i64,

    /// Price at `t`
    pub p: f64,
}

/// A bounded price series, oldest point first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Ticker as requested (without any provider suffix)
    pub symbol: String,

    /// Currency of every point in `data`
    pub currency: String,

    /// Ordered points, at most the configured maximum
    pub data: Vec<ChartPoint>,
}
