//! Alpaca API request and response types.
//!
//! These types map directly to Alpaca's REST API format.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AlpacaError;
use crate::application::ports::SubmitOrderRequest;
use crate::domain::order_execution::{Order, OrderSide, OrderSize, OrderStatus, OrderType};
use crate::domain::position_sizing::AssetInfo;
use crate::domain::shared::{ClientOrderId, DomainError, OrderId, Symbol};

// ============================================================================
// Order Request Types
// ============================================================================

/// Order request for Alpaca API.
#[derive(Debug, Clone, Serialize)]
pub struct AlpacaOrderRequest {
    /// Stock symbol.
    pub symbol: String,
    /// Quantity (shares).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<String>,
    /// Notional value (dollars).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notional: Option<String>,
    /// Order side.
    pub side: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Time in force.
    pub time_in_force: String,
    /// Limit price (for limit orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
    /// Client order ID.
    pub client_order_id: String,
}

impl From<&SubmitOrderRequest> for AlpacaOrderRequest {
    fn from(request: &SubmitOrderRequest) -> Self {
        let (qty, notional) = match request.size {
            OrderSize::Shares(qty) => (Some(qty.normalize().to_string()), None),
            OrderSize::Notional(amount) => (None, Some(amount.round_dp(2).to_string())),
        };

        Self {
            symbol: request.symbol.as_str().to_string(),
            qty,
            notional,
            side: request.side.as_str().to_string(),
            order_type: request.order_type.as_str().to_string(),
            time_in_force: request.time_in_force.as_str().to_string(),
            limit_price: request.limit_price.map(|p| p.normalize().to_string()),
            client_order_id: request.client_order_id.as_str().to_string(),
        }
    }
}

// ============================================================================
// Order Response Types
// ============================================================================

/// Order response from Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaOrderResponse {
    /// Broker order ID.
    pub id: String,
    /// Client order ID.
    #[serde(default)]
    pub client_order_id: Option<String>,
    /// Symbol.
    pub symbol: String,
    /// Quantity; null for notional orders until sized.
    #[serde(default)]
    pub qty: Option<String>,
    /// Notional amount for dollar-sized orders.
    #[serde(default)]
    pub notional: Option<String>,
    /// Filled quantity.
    #[serde(default)]
    pub filled_qty: Option<String>,
    /// Average fill price.
    #[serde(default)]
    pub filled_avg_price: Option<String>,
    /// Order status.
    pub status: String,
    /// Order side.
    pub side: String,
    /// Order type.
    #[serde(rename = "type", default)]
    pub order_type: Option<String>,
    /// Time in force.
    #[serde(default)]
    pub time_in_force: Option<String>,
    /// Limit price.
    #[serde(default)]
    pub limit_price: Option<String>,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AlpacaOrderResponse {
    /// Convert to the domain order snapshot.
    pub fn to_order(&self) -> Result<Order, AlpacaError> {
        let side: OrderSide = self
            .side
            .parse()
            .map_err(|e: DomainError| AlpacaError::JsonParse(e.to_string()))?;
        // Stop and trailing types never originate here; treat them as market
        let order_type = self
            .order_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(OrderType::Market);
        let time_in_force = self
            .time_in_force
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();

        Ok(Order {
            id: OrderId::new(&self.id),
            client_order_id: self.client_order_id.as_deref().map(ClientOrderId::new),
            symbol: Symbol::new(&self.symbol),
            side,
            quantity: parse_optional_decimal("qty", self.qty.as_deref())?.unwrap_or(Decimal::ZERO),
            notional: parse_optional_decimal("notional", self.notional.as_deref())?,
            order_type,
            limit_price: parse_optional_decimal("limit_price", self.limit_price.as_deref())?,
            time_in_force,
            status: parse_order_status(&self.status),
            filled_quantity: parse_optional_decimal("filled_qty", self.filled_qty.as_deref())?
                .unwrap_or(Decimal::ZERO),
            avg_fill_price: parse_optional_decimal(
                "filled_avg_price",
                self.filled_avg_price.as_deref(),
            )?,
            created_at: self.created_at,
            updated_at: self.updated_at.unwrap_or(self.created_at),
        })
    }
}

// ============================================================================
// Position and Asset Types
// ============================================================================

/// Position response from Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaPositionResponse {
    /// Symbol.
    pub symbol: String,
    /// Quantity; negative for shorts.
    pub qty: String,
}

/// Asset response from Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaAssetResponse {
    /// Symbol.
    pub symbol: String,
    /// Whether fractional quantities can be bought.
    #[serde(default)]
    pub fractionable: bool,
    /// Whether the asset can be traded.
    #[serde(default)]
    pub tradable: bool,
}

impl AlpacaAssetResponse {
    /// Convert to domain asset info.
    #[must_use]
    pub fn to_asset_info(&self) -> AssetInfo {
        AssetInfo {
            symbol: Symbol::new(&self.symbol),
            fractionable: self.fractionable,
            tradable: self.tradable,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error response from Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaErrorResponse {
    /// Error code; Alpaca sends a number.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    /// Error message.
    pub message: String,
}

impl AlpacaErrorResponse {
    /// Error code as text, whether sent as a number or a string.
    #[must_use]
    pub fn code_string(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(code) => Some(code.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse an Alpaca decimal string that may be absent.
pub fn parse_optional_decimal(field: &str, value: Option<&str>) -> Result<Option<Decimal>, AlpacaError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<Decimal>()
                .map_err(|e| AlpacaError::JsonParse(format!("{field}: {e}")))
        })
        .transpose()
}

/// Parse Alpaca order status string to domain `OrderStatus`.
///
/// A replaced order is terminal from our side: its replacement carries a
/// new id.
#[must_use]
pub fn parse_order_status(status: &str) -> OrderStatus {
    match status.to_ascii_lowercase().as_str() {
        "pending_new" => OrderStatus::PendingNew,
        "accepted" | "accepted_for_bidding" | "pending_replace" | "held" | "calculated"
        | "stopped" | "suspended" => OrderStatus::Accepted,
        "partially_filled" => OrderStatus::PartiallyFilled,
        "filled" => OrderStatus::Filled,
        "pending_cancel" => OrderStatus::PendingCancel,
        "canceled" | "replaced" => OrderStatus::Canceled,
        "done_for_day" | "expired" => OrderStatus::Expired,
        "rejected" => OrderStatus::Rejected,
        _ => OrderStatus::New,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ORDER_JSON: &str = r#"{
        "id": "61e69015-8549-4bfd-b9c3-01e75843f47d",
        "client_order_id": "eb9e2aaa-f71a-4f51-b5b4-52a6c565dad4",
        "created_at": "2024-01-15T14:30:00.123456Z",
        "updated_at": "2024-01-15T14:30:02.5Z",
        "symbol": "AAPL",
        "qty": "15",
        "notional": null,
        "filled_qty": "5",
        "filled_avg_price": "185.21",
        "type": "limit",
        "side": "buy",
        "time_in_force": "day",
        "limit_price": "185.25",
        "status": "partially_filled"
    }"#;

    #[test]
    fn order_response_converts_to_domain() {
        let response: AlpacaOrderResponse = serde_json::from_str(ORDER_JSON).unwrap();
        let order = response.to_order().unwrap();

        assert_eq!(order.id.as_str(), "61e69015-8549-4bfd-b9c3-01e75843f47d");
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.quantity, dec!(15));
        assert_eq!(order.filled_quantity, dec!(5));
        assert_eq!(order.avg_fill_price, Some(dec!(185.21)));
        assert_eq!(order.limit_price, Some(dec!(185.25)));
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert!(order.updated_at > order.created_at);
    }

    #[test]
    fn notional_order_without_qty() {
        let json = r#"{
            "id": "o-1",
            "created_at": "2024-01-15T14:30:00Z",
            "symbol": "AAPL",
            "qty": null,
            "notional": "250",
            "filled_qty": "0",
            "type": "market",
            "side": "sell",
            "status": "new"
        }"#;
        let order: AlpacaOrderResponse = serde_json::from_str(json).unwrap();
        let order = order.to_order().unwrap();

        assert_eq!(order.quantity, Decimal::ZERO);
        assert_eq!(order.notional, Some(dec!(250)));
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.avg_fill_price, None);
    }

    #[test]
    fn bad_decimal_is_parse_error() {
        let mut response: AlpacaOrderResponse = serde_json::from_str(ORDER_JSON).unwrap();
        response.filled_qty = Some("five".to_string());
        assert!(matches!(response.to_order(), Err(AlpacaError::JsonParse(_))));
    }

    #[test]
    fn limit_request_serialization() {
        let request = SubmitOrderRequest::limit(
            Symbol::new("AAPL"),
            OrderSide::Sell,
            dec!(10.500),
            dec!(15.1900),
        );
        let body = serde_json::to_value(AlpacaOrderRequest::from(&request)).unwrap();

        assert_eq!(body["qty"], "10.5");
        assert_eq!(body["limit_price"], "15.19");
        assert_eq!(body["type"], "limit");
        assert_eq!(body["side"], "sell");
        assert_eq!(body["time_in_force"], "day");
        assert!(body.get("notional").is_none());
    }

    #[test]
    fn notional_request_serialization() {
        let request = SubmitOrderRequest::market(
            Symbol::new("AAPL"),
            OrderSide::Buy,
            OrderSize::Notional(dec!(250.456)),
        );
        let body = serde_json::to_value(AlpacaOrderRequest::from(&request)).unwrap();

        assert_eq!(body["notional"], "250.46");
        assert!(body.get("qty").is_none());
        assert!(body.get("limit_price").is_none());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(parse_order_status("new"), OrderStatus::New);
        assert_eq!(parse_order_status("pending_new"), OrderStatus::PendingNew);
        assert_eq!(parse_order_status("accepted"), OrderStatus::Accepted);
        assert_eq!(parse_order_status("partially_filled"), OrderStatus::PartiallyFilled);
        assert_eq!(parse_order_status("filled"), OrderStatus::Filled);
        assert_eq!(parse_order_status("pending_cancel"), OrderStatus::PendingCancel);
        assert_eq!(parse_order_status("canceled"), OrderStatus::Canceled);
        assert_eq!(parse_order_status("replaced"), OrderStatus::Canceled);
        assert_eq!(parse_order_status("done_for_day"), OrderStatus::Expired);
        assert_eq!(parse_order_status("REJECTED"), OrderStatus::Rejected);
        assert_eq!(parse_order_status("something_new"), OrderStatus::New);
    }

    #[test]
    fn error_code_as_text() {
        let numeric: AlpacaErrorResponse =
            serde_json::from_str(r#"{"code":40310000,"message":"insufficient buying power"}"#)
                .unwrap();
        assert_eq!(numeric.code_string().as_deref(), Some("40310000"));

        let missing: AlpacaErrorResponse = serde_json::from_str(r#"{"message":"x"}"#).unwrap();
        assert_eq!(missing.code_string(), None);
    }

    #[test]
    fn asset_response() {
        let asset: AlpacaAssetResponse =
            serde_json::from_str(r#"{"symbol":"BRK.A","fractionable":false,"tradable":true}"#)
                .unwrap();
        let info = asset.to_asset_info();
        assert!(!info.fractionable);
        assert!(info.tradable);
    }
}
