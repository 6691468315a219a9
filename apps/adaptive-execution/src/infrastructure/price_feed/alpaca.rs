//! Alpaca Market Data quote source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::ports::{PriceFeedError, Quote, QuoteSourcePort};
use crate::domain::shared::Symbol;
use crate::infrastructure::broker::alpaca::{AlpacaConfig, AlpacaError, AlpacaHttpClient};

/// Quote source backed by Alpaca's latest-quote and latest-trade endpoints.
#[derive(Debug, Clone)]
pub struct AlpacaQuoteSource {
    client: AlpacaHttpClient,
}

impl AlpacaQuoteSource {
    /// Create a new quote source.
    pub fn new(config: &AlpacaConfig) -> Result<Self, AlpacaError> {
        if !config.has_credentials() {
            return Err(AlpacaError::AuthenticationFailed);
        }
        Ok(Self {
            client: AlpacaHttpClient::new(config)?,
        })
    }
}

#[async_trait]
impl QuoteSourcePort for AlpacaQuoteSource {
    async fn get_latest_quote(&self, symbol: &Symbol) -> Result<Quote, PriceFeedError> {
        let path = format!("/v2/stocks/{}/quotes/latest", symbol.as_str().to_uppercase());
        let response: LatestQuoteResponse = self.client.data_get(&path).await?;
        let raw = response.quote;

        tracing::debug!(
            symbol = %symbol,
            bid = %raw.bp,
            ask = %raw.ap,
            "Latest quote"
        );

        Ok(Quote {
            symbol: symbol.clone(),
            bid: raw.bp,
            ask: raw.ap,
            bid_size: raw.bs,
            ask_size: raw.ask_size,
            timestamp: raw.t.unwrap_or_else(Utc::now),
        })
    }

    async fn get_last_trade_price(&self, symbol: &Symbol) -> Result<Decimal, PriceFeedError> {
        let path = format!("/v2/stocks/{}/trades/latest", symbol.as_str().to_uppercase());
        let response: LatestTradeResponse = self.client.data_get(&path).await?;

        if response.trade.p <= Decimal::ZERO {
            return Err(PriceFeedError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(response.trade.p)
    }
}

#[derive(Debug, Deserialize)]
struct LatestQuoteResponse {
    quote: RawQuote,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    /// Quote time.
    t: Option<DateTime<Utc>>,
    /// Bid price.
    #[serde(default)]
    bp: Decimal,
    /// Ask price.
    #[serde(default)]
    ap: Decimal,
    /// Bid size.
    #[serde(default)]
    bs: Decimal,
    /// Ask size.
    #[serde(rename = "as", default)]
    ask_size: Decimal,
}

#[derive(Debug, Deserialize)]
struct LatestTradeResponse {
    trade: RawTrade,
}

#[derive(Debug, Deserialize)]
struct RawTrade {
    /// Trade price.
    p: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::infrastructure::broker::alpaca::AlpacaEnvironment;

    fn source(server: &MockServer) -> AlpacaQuoteSource {
        let config =
            AlpacaConfig::new("key".to_string(), "secret".to_string(), AlpacaEnvironment::Paper)
                .with_base_url(server.uri());
        AlpacaQuoteSource::new(&config).unwrap()
    }

    #[test]
    fn requires_credentials() {
        let config =
            AlpacaConfig::new(String::new(), "secret".to_string(), AlpacaEnvironment::Paper);
        assert!(AlpacaQuoteSource::new(&config).is_err());
    }

    #[tokio::test]
    async fn fetches_latest_quote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/stocks/AAPL/quotes/latest"))
            .and(header("APCA-API-KEY-ID", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "AAPL",
                "quote": {
                    "t": "2026-03-02T15:04:05.123456789Z",
                    "bp": 15.20,
                    "bs": 3,
                    "ap": 15.25,
                    "as": 2,
                    "bx": "V",
                    "ax": "V",
                    "c": ["R"],
                    "z": "C"
                }
            })))
            .mount(&server)
            .await;

        let quote = source(&server)
            .get_latest_quote(&Symbol::new("aapl"))
            .await
            .unwrap();

        assert_eq!(quote.bid, dec!(15.2));
        assert_eq!(quote.ask, dec!(15.25));
        assert_eq!(quote.ask_size, dec!(2));
        assert!(quote.is_valid());
    }

    #[tokio::test]
    async fn empty_book_is_returned_as_invalid_quote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/stocks/AAPL/quotes/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "AAPL",
                "quote": { "bp": 0, "ap": 0 }
            })))
            .mount(&server)
            .await;

        let quote = source(&server)
            .get_latest_quote(&Symbol::new("AAPL"))
            .await
            .unwrap();
        assert!(!quote.is_valid());
    }

    #[tokio::test]
    async fn fetches_last_trade_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/stocks/AAPL/trades/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "AAPL",
                "trade": { "t": "2026-03-02T15:04:05Z", "p": 189.5, "s": 100 }
            })))
            .mount(&server)
            .await;

        let price = source(&server)
            .get_last_trade_price(&Symbol::new("AAPL"))
            .await
            .unwrap();
        assert_eq!(price, dec!(189.5));
    }

    #[tokio::test]
    async fn unknown_symbol_maps_to_symbol_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/stocks/ZZZZ/quotes/latest"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "message": "not found" })),
            )
            .mount(&server)
            .await;

        let err = source(&server)
            .get_latest_quote(&Symbol::new("ZZZZ"))
            .await
            .unwrap_err();
        assert!(matches!(err, PriceFeedError::UnknownSymbol { .. }));
    }
}
