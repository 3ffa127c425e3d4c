use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;
use crate::models::chart::ChartPoint;

/// Reduce `points` to at most `max` entries by even index stride.
///
/// Picks `points[i * (n - 1) / (max - 1)]` for `i` in `0..max`, so the first
/// and last points always survive. Deterministic and idempotent: a series
/// already within `max` comes back unchanged, `max == 1` keeps only the
/// first point and `max == 0` yields nothing.
pub fn downsample(points: &[ChartPoint], max: usize) -> Vec<ChartPoint> {
    let n = points.len();
    if n <= max {
        return points.to_vec();
    }
    if max <= 1 {
        return points[..max].to_vec();
    }
    (0..max).map(|i| points[i * (n - 1) / (max - 1)]).collect()
}

/// Look-back windows offered for crypto charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CryptoChartDays {
    One,
    #[default]
    Seven,
    Fourteen,
    Thirty,
    Ninety,
}

impl CryptoChartDays {
    pub fn days(&self) -> u32 {
        match self {
            CryptoChartDays::One => 1,
            CryptoChartDays::Seven => 7,
            CryptoChartDays::Fourteen => 14,
            CryptoChartDays::Thirty => 30,
            CryptoChartDays::Ninety => 90,
        }
    }
}

impl TryFrom<u32> for CryptoChartDays {
    type Error = CoreError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            1 => Ok(CryptoChartDays::One),
            7 => Ok(CryptoChartDays::Seven),
            14 => Ok(CryptoChartDays::Fourteen),
            30 => Ok(CryptoChartDays::Thirty),
            90 => Ok(CryptoChartDays::Ninety),
            other => Err(CoreError::Validation(format!(
                "days must be one of: 1, 7, 14, 30, 90 (got {other})"
            ))),
        }
    }
}

/// Yahoo chart ranges accepted for stock charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StockChartRange {
    OneDay,
    FiveDays,
    #[default]
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl StockChartRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockChartRange::OneDay => "1d",
            StockChartRange::FiveDays => "5d",
            StockChartRange::OneMonth => "1mo",
            StockChartRange::ThreeMonths => "3mo",
            StockChartRange::SixMonths => "6mo",
            StockChartRange::OneYear => "1y",
            StockChartRange::TwoYears => "2y",
            StockChartRange::FiveYears => "5y",
            StockChartRange::TenYears => "10y",
            StockChartRange::YearToDate => "ytd",
            StockChartRange::Max => "max",
        }
    }
}

impl FromStr for StockChartRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(StockChartRange::default()),
            "1d" => Ok(StockChartRange::OneDay),
            "5d" => Ok(StockChartRange::FiveDays),
            "1mo" => Ok(StockChartRange::OneMonth),
            "3mo" => Ok(StockChartRange::ThreeMonths),
            "6mo" => Ok(StockChartRange::SixMonths),
            "1y" => Ok(StockChartRange::OneYear),
            "2y" => Ok(StockChartRange::TwoYears),
            "5y" => Ok(StockChartRange::FiveYears),
            "10y" => Ok(StockChartRange::TenYears),
            "ytd" => Ok(StockChartRange::YearToDate),
            "max" => Ok(StockChartRange::Max),
            other => Err(CoreError::Validation(format!(
                "range must be one of: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for StockChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bar interval accepted for stock charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StockChartInterval {
    #[default]
    Day,
    Week,
    Month,
}

impl StockChartInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockChartInterval::Day => "1d",
            StockChartInterval::Week => "1wk",
            StockChartInterval::Month => "1mo",
        }
    }
}

impl FromStr for StockChartInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(StockChartInterval::default()),
            "1d" => Ok(StockChartInterval::Day),
            "1wk" => Ok(StockChartInterval::Week),
            "1mo" => Ok(StockChartInterval::Month),
            other => Err(CoreError::Validation(format!(
                "interval must be one of: 1d, 1wk, 1mo (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for StockChartInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
