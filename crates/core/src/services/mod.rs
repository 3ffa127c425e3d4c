pub mod analytics_service;
pub mod chart_service;
pub mod currency_service;
pub mod performance_service;
pub mod portfolio_service;
pub mod price_service;
pub mod valuation_service;
