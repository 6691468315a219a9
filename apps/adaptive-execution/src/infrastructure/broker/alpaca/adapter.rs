//! Alpaca gateway implementing `OrderGatewayPort`.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{GatewayError, OrderGatewayPort, SubmitOrderRequest};
use crate::domain::order_execution::Order;
use crate::domain::position_sizing::AssetInfo;
use crate::domain::shared::{OrderId, Symbol};

use super::api_types::{
    AlpacaAssetResponse, AlpacaOrderRequest, AlpacaOrderResponse, AlpacaPositionResponse,
    parse_optional_decimal,
};
use super::config::{AlpacaConfig, AlpacaEnvironment};
use super::error::AlpacaError;
use super::http_client::AlpacaHttpClient;

/// Alpaca Markets order gateway.
#[derive(Debug, Clone)]
pub struct AlpacaGateway {
    client: AlpacaHttpClient,
    environment: AlpacaEnvironment,
}

impl AlpacaGateway {
    /// Create a new Alpaca gateway.
    pub fn new(config: &AlpacaConfig) -> Result<Self, AlpacaError> {
        let client = AlpacaHttpClient::new(config)?;
        Ok(Self {
            client,
            environment: config.environment,
        })
    }

    /// Check if we're in live trading mode.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.environment.is_live()
    }
}

#[async_trait]
impl OrderGatewayPort for AlpacaGateway {
    async fn submit_order(&self, request: SubmitOrderRequest) -> Result<Order, GatewayError> {
        if self.is_live() {
            tracing::warn!(
                client_order_id = %request.client_order_id,
                symbol = %request.symbol,
                "Submitting LIVE order - this will execute real trades"
            );
        }

        let alpaca_request = AlpacaOrderRequest::from(&request);

        tracing::info!(
            client_order_id = %request.client_order_id,
            symbol = %request.symbol,
            side = %alpaca_request.side,
            order_type = %alpaca_request.order_type,
            qty = ?alpaca_request.qty,
            notional = ?alpaca_request.notional,
            limit_price = ?alpaca_request.limit_price,
            "Submitting order to Alpaca"
        );

        let response: AlpacaOrderResponse = self
            .client
            .post("/v2/orders", &alpaca_request)
            .await
            .map_err(GatewayError::from)?;

        tracing::info!(
            client_order_id = %request.client_order_id,
            order_id = %response.id,
            status = %response.status,
            "Order accepted by Alpaca"
        );

        response.to_order().map_err(GatewayError::from)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), GatewayError> {
        tracing::info!(order_id = %order_id, "Canceling order");
        self.client
            .delete(&format!("/v2/orders/{order_id}"))
            .await
            .map_err(GatewayError::from)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, GatewayError> {
        let response: AlpacaOrderResponse = self
            .client
            .get(&format!("/v2/orders/{order_id}"))
            .await
            .map_err(GatewayError::from)?;

        response.to_order().map_err(GatewayError::from)
    }

    async fn get_position(&self, symbol: &Symbol) -> Result<Decimal, GatewayError> {
        let result: Result<AlpacaPositionResponse, AlpacaError> = self
            .client
            .get(&format!("/v2/positions/{}", symbol.path_segment()))
            .await;

        match result {
            Ok(position) => Ok(parse_optional_decimal("qty", Some(&position.qty))
                .map_err(GatewayError::from)?
                .unwrap_or(Decimal::ZERO)),
            // No open position
            Err(AlpacaError::NotFound { .. }) => Ok(Decimal::ZERO),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_asset_info(&self, symbol: &Symbol) -> Result<AssetInfo, GatewayError> {
        let asset: AlpacaAssetResponse = self
            .client
            .get(&format!("/v2/assets/{}", symbol.path_segment()))
            .await
            .map_err(GatewayError::from)?;

        Ok(asset.to_asset_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::{ErrorKind, OrderSide, OrderStatus, OrderType};
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> AlpacaGateway {
        let config = AlpacaConfig::new("key".to_string(), "secret".to_string(), AlpacaEnvironment::Paper)
            .with_base_url(server.uri());
        AlpacaGateway::new(&config).unwrap()
    }

    fn order_body(status: &str, filled: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "ord-1",
            "client_order_id": "cli-1",
            "created_at": "2024-03-04T14:31:00Z",
            "updated_at": "2024-03-04T14:31:01Z",
            "symbol": "AAPL",
            "qty": "10",
            "filled_qty": filled,
            "filled_avg_price": if filled == "0" { serde_json::Value::Null } else { "175.02".into() },
            "type": "limit",
            "side": "buy",
            "time_in_force": "day",
            "limit_price": "175.05",
            "status": status
        })
    }

    #[tokio::test]
    async fn submits_limit_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .and(body_partial_json(serde_json::json!({
                "symbol": "AAPL",
                "qty": "10",
                "side": "buy",
                "type": "limit",
                "limit_price": "175.05",
                "time_in_force": "day"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_body("new", "0")))
            .expect(1)
            .mount(&server)
            .await;

        let order = gateway(&server)
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(10), dec!(175.05))
            .await
            .unwrap();

        assert_eq!(order.id.as_str(), "ord-1");
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.status, OrderStatus::New);
    }

    #[tokio::test]
    async fn insufficient_buying_power_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "code": 40_310_000,
                "message": "insufficient buying power"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(10), dec!(175.05))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[tokio::test]
    async fn reads_order_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/orders/ord-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_body("filled", "10")))
            .mount(&server)
            .await;

        let order = gateway(&server).get_order(&OrderId::new("ord-1")).await.unwrap();
        assert!(order.is_terminal());
        assert_eq!(order.filled_quantity, dec!(10));
        assert_eq!(order.avg_fill_price, Some(dec!(175.02)));
    }

    #[tokio::test]
    async fn cancel_uses_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/orders/ord-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server).cancel_order(&OrderId::new("ord-1")).await.unwrap();
    }

    #[tokio::test]
    async fn cancel_of_filled_order_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/orders/ord-1"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "code": 42_210_000,
                "message": "order is already in \"filled\" state"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).cancel_order(&OrderId::new("ord-1")).await.unwrap_err();
        assert!(matches!(err, GatewayError::OrderRejected { .. }));
    }

    #[tokio::test]
    async fn missing_position_is_flat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/positions/AAPL"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "code": 40_410_000,
                "message": "position does not exist"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/positions/MSFT"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"symbol": "MSFT", "qty": "907.32"})),
            )
            .mount(&server)
            .await;

        let gateway = gateway(&server);
        assert_eq!(gateway.get_position(&Symbol::new("AAPL")).await.unwrap(), Decimal::ZERO);
        assert_eq!(gateway.get_position(&Symbol::new("MSFT")).await.unwrap(), dec!(907.32));
    }

    #[tokio::test]
    async fn reads_asset_fractionability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/assets/BRK.A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "BRK.A",
                "fractionable": false,
                "tradable": true
            })))
            .mount(&server)
            .await;

        let info = gateway(&server).get_asset_info(&Symbol::new("BRK.A")).await.unwrap();
        assert!(!info.fractionable);
    }
}
