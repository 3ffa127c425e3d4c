pub mod analytics;
pub mod asset;
pub mod chart;
pub mod price;
pub mod valuation;
