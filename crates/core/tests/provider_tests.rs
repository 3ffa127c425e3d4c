// ═══════════════════════════════════════════════════════════════════
// Provider Tests — CoinGecko and Yahoo Finance against a mock HTTP server
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wealth_valuation_core::errors::CoreError;
use wealth_valuation_core::providers::coingecko::CoinGeckoProvider;
use wealth_valuation_core::providers::traits::{CryptoQuoteProvider, MarketQuoteProvider};
use wealth_valuation_core::providers::yahoo_finance::YahooFinanceProvider;

async fn coingecko() -> (MockServer, CoinGeckoProvider) {
    let server = MockServer::start().await;
    let provider = CoinGeckoProvider::new(Client::new()).with_base_url(&server.uri());
    (server, provider)
}

async fn yahoo() -> (MockServer, YahooFinanceProvider) {
    let server = MockServer::start().await;
    let provider = YahooFinanceProvider::new(Client::new()).with_base_url(&server.uri());
    (server, provider)
}

fn yahoo_body(currency: &str, price: f64, timestamps: &[i64], closes: &[Option<f64>]) -> serde_json::Value {
    json!({
        "chart": {
            "result": [{
                "meta": { "currency": currency, "regularMarketPrice": price },
                "timestamp": timestamps,
                "indicators": { "quote": [{ "close": closes }] }
            }],
            "error": null
        }
    })
}

// ═══════════════════════════════════════════════════════════════════
// CoinGecko
// ═══════════════════════════════════════════════════════════════════

mod coingecko_provider {
    use super::*;

    #[test]
    fn maps_common_tickers() {
        assert_eq!(CoinGeckoProvider::coin_id("BTC"), Some("bitcoin"));
        assert_eq!(CoinGeckoProvider::coin_id("eth"), Some("ethereum"));
        assert_eq!(CoinGeckoProvider::coin_id("AVAX"), Some("avalanche-2"));
        assert_eq!(CoinGeckoProvider::coin_id("ZZZ"), None);
    }

    #[tokio::test]
    async fn spot_price() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "solana"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"solana": {"usd": 86.59}})))
            .expect(1)
            .mount(&server)
            .await;

        let price = provider.spot_price("SOL", "USD").await.unwrap();
        assert_eq!(price, dec!(86.59));
    }

    #[tokio::test]
    async fn sends_demo_key_when_configured() {
        let (server, provider) = coingecko().await;
        let provider = provider.with_api_key(Some("demo-key".into()));
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(header("x-cg-demo-api-key", "demo-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {"idr": 1.5e9}})))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(provider.spot_price("BTC", "IDR").await.unwrap(), dec!(1500000000));
    }

    #[tokio::test]
    async fn unmapped_symbol_never_reaches_the_network() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider.spot_price("ZZZ", "USD").await.unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedSymbol(s) if s == "ZZZ"));
        assert!(!provider.supports("ZZZ"));
    }

    #[tokio::test]
    async fn missing_currency_is_not_found() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {}})))
            .mount(&server)
            .await;

        let err = provider.spot_price("BTC", "XAU").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_coin_404_is_not_found() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/ohlc"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "coin not found"})))
            .mount(&server)
            .await;

        let err = provider.ohlcv("BTC", "USD", 7).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn rate_limit_is_transient_upstream_error() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider.spot_price("BTC", "USD").await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn malformed_body_is_upstream_error() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = provider.spot_price("BTC", "USD").await.unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn historical_price_uses_day_first_date() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/history"))
            .and(query_param("date", "15-01-2025"))
            .and(query_param("localization", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "bitcoin",
                "market_data": { "current_price": { "usd": 100250.5 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let price = provider.historical_price("BTC", "USD", date).await.unwrap();
        assert_eq!(price, dec!(100250.5));
    }

    #[tokio::test]
    async fn historical_price_before_listing_is_not_found() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .and(path("/coins/solana/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "solana"})))
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let err = provider.historical_price("SOL", "USD", date).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn ohlcv_candles() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .and(path("/coins/ethereum/ohlc"))
            .and(query_param("vs_currency", "usd"))
            .and(query_param("days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [1_736_899_200_000_i64, 3200.0, 3300.5, 3150.0, 3280.25],
                [1_736_913_600_000_i64, 3280.25, 3310.0, 3250.0, 3300.0]
            ])))
            .mount(&server)
            .await;

        let candles = provider.ohlcv("ETH", "USD", 7).await.unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, dec!(3200));
        assert_eq!(candles[0].high, dec!(3300.5));
        assert_eq!(candles[0].close, dec!(3280.25));
        assert_eq!(candles[0].time_open.timestamp(), 1_736_899_200);
        assert_eq!(candles[0].volume, dec!(0));
        assert_eq!(candles[1].currency, "USD");
        assert!(candles[0].time_open < candles[1].time_open);
    }

    #[tokio::test]
    async fn market_chart_converts_millis_to_seconds() {
        let (server, provider) = coingecko().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .and(query_param("days", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "prices": [[1_700_000_000_000_i64, 37000.5], [1_700_003_600_000_i64, 37100.0]],
                "market_caps": [],
                "total_volumes": []
            })))
            .mount(&server)
            .await;

        let points = provider.market_chart("BTC", "USD", 30).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].t, 1_700_000_000);
        assert_eq!(points[0].p, 37000.5);
        assert_eq!(points[1].t, 1_700_003_600);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Yahoo Finance
// ═══════════════════════════════════════════════════════════════════

mod yahoo_provider {
    use super::*;

    #[test]
    fn fx_symbol_format() {
        let provider = YahooFinanceProvider::new(Client::new());
        assert_eq!(provider.fx_symbol("usd", "idr"), "USDIDR=X");
    }

    #[tokio::test]
    async fn quote_reports_native_currency() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/BBCA.JK"))
            .and(query_param("range", "1d"))
            .and(query_param("interval", "1d"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(yahoo_body("IDR", 9875.0, &[1_736_899_200], &[Some(9875.0)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let quote = provider.quote("BBCA.JK").await.unwrap();
        assert_eq!(quote.price, dec!(9875));
        assert_eq!(quote.currency, "IDR");
    }

    #[tokio::test]
    async fn fx_pair_quote() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/USDIDR=X"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(yahoo_body("IDR", 16250.5, &[1_736_899_200], &[Some(16250.5)])),
            )
            .mount(&server)
            .await;

        let quote = provider.quote(&provider.fx_symbol("USD", "IDR")).await.unwrap();
        assert_eq!(quote.price, dec!(16250.5));
    }

    #[tokio::test]
    async fn unknown_symbol_404_is_not_found() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NOPE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
                }
            })))
            .mount(&server)
            .await;

        let err = provider.quote("NOPE").await.unwrap_err();
        match err {
            CoreError::NotFound(msg) => assert!(msg.contains("delisted")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_upstream_unavailable() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let err = provider.quote("AAPL").await.unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"chart": {"result": [], "error": null}})),
            )
            .mount(&server)
            .await;

        let err = provider.quote("AAPL").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_currency_is_upstream_error() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": { "result": [{ "meta": { "regularMarketPrice": 10.0 } }], "error": null }
            })))
            .mount(&server)
            .await;

        let err = provider.quote("AAPL").await.unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn chart_skips_null_closes() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("range", "5d"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(yahoo_body(
                "USD",
                190.0,
                &[100, 200, 300, 400],
                &[Some(185.5), None, Some(188.0), Some(190.0)],
            )))
            .mount(&server)
            .await;

        let chart = provider.chart("AAPL", "5d", "1d").await.unwrap();
        assert_eq!(chart.currency.as_deref(), Some("USD"));
        let times: Vec<i64> = chart.points.iter().map(|p| p.t).collect();
        assert_eq!(times, vec![100, 300, 400]);
        assert_eq!(chart.points[0].p, 185.5);
    }

    #[tokio::test]
    async fn chart_without_closes_is_not_found() {
        let (server, provider) = yahoo().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(yahoo_body("USD", 1.0, &[], &[])))
            .mount(&server)
            .await;

        let err = provider.chart("AAPL", "1mo", "1d").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
