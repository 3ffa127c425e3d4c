pub mod traits;

// API provider implementations
pub mod coingecko;
pub mod yahoo_finance;

use reqwest::Client;

use crate::config::EngineConfig;
use crate::errors::CoreError;

/// Shared HTTP client for every upstream call, bounded by the configured
/// total and connect timeouts.
pub fn http_client(config: &EngineConfig) -> Result<Client, CoreError> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))
}
