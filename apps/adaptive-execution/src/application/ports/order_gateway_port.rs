//! Order Gateway Port (Driven Port)
//!
//! Interface for submitting, canceling and inspecting broker orders, plus
//! the position and asset lookups the quantity safeguard needs.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{
    ErrorKind, ExecutionError, Order, OrderSide, OrderSize, OrderType, TimeInForce,
};
use crate::domain::position_sizing::AssetInfo;
use crate::domain::shared::{ClientOrderId, OrderId, Symbol};

/// Request to submit an order to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    /// Client order ID.
    pub client_order_id: ClientOrderId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Shares or notional.
    pub size: OrderSize,
    /// Limit price (for limit orders).
    pub limit_price: Option<Decimal>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl SubmitOrderRequest {
    /// Create a market order request.
    #[must_use]
    pub fn market(symbol: Symbol, side: OrderSide, size: OrderSize) -> Self {
        Self {
            client_order_id: ClientOrderId::generate(),
            symbol,
            side,
            order_type: OrderType::Market,
            size,
            limit_price: None,
            time_in_force: TimeInForce::Day,
        }
    }

    /// Create a limit order request.
    #[must_use]
    pub fn limit(symbol: Symbol, side: OrderSide, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            client_order_id: ClientOrderId::generate(),
            symbol,
            side,
            order_type: OrderType::Limit,
            size: OrderSize::Shares(quantity),
            limit_price: Some(limit_price),
            time_in_force: TimeInForce::Day,
        }
    }

    /// Set time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }
}

/// Order gateway error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Connection error.
    #[error("Broker connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// Order rejected by broker.
    #[error("Order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason.
        reason: String,
    },

    /// Order not found.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The missing order ID.
        order_id: String,
    },

    /// Insufficient funds.
    #[error("Insufficient buying power: {message}")]
    InsufficientFunds {
        /// Broker message.
        message: String,
    },

    /// The request itself was malformed.
    #[error("Invalid order request: {message}")]
    InvalidRequest {
        /// Error details.
        message: String,
    },

    /// Rate limited.
    #[error("Rate limited by broker")]
    RateLimited,

    /// Unknown error.
    #[error("Broker error: {message}")]
    Unknown {
        /// Error details.
        message: String,
    },
}

impl GatewayError {
    /// Execution error category for this failure.
    ///
    /// Rejections whose text reports a buying-power shortfall count as
    /// insufficient funds.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::OrderRejected { reason } if mentions_insufficient_funds(reason) => {
                ErrorKind::InsufficientFunds
            }
            Self::OrderRejected { .. } | Self::OrderNotFound { .. } => ErrorKind::GatewayRejection,
            Self::InvalidRequest { .. } => ErrorKind::Input,
            Self::ConnectionError { .. } | Self::RateLimited | Self::Unknown { .. } => {
                ErrorKind::Unclassified
            }
        }
    }
}

impl From<GatewayError> for ExecutionError {
    fn from(err: GatewayError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Whether a broker message reports a buying-power shortfall.
#[must_use]
pub fn mentions_insufficient_funds(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("insufficient buying power")
        || lower.contains("insufficient funds")
        || lower.contains("insufficient day trading buying power")
}

/// Port for broker order interactions.
#[async_trait]
pub trait OrderGatewayPort: Send + Sync {
    /// Submit an order to the broker.
    async fn submit_order(&self, request: SubmitOrderRequest) -> Result<Order, GatewayError>;

    /// Request cancellation of an order.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), GatewayError>;

    /// Get the latest state of an order.
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, GatewayError>;

    /// Held quantity for a symbol; zero when flat.
    async fn get_position(&self, symbol: &Symbol) -> Result<Decimal, GatewayError>;

    /// Tradability facts for a symbol.
    async fn get_asset_info(&self, symbol: &Symbol) -> Result<AssetInfo, GatewayError>;

    /// Submit a day limit order for a share quantity.
    async fn submit_limit_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Result<Order, GatewayError> {
        self.submit_order(SubmitOrderRequest::limit(
            symbol.clone(),
            side,
            quantity,
            limit_price,
        ))
        .await
    }

    /// Submit a day market order sized in shares or dollars.
    async fn submit_market_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        size: OrderSize,
    ) -> Result<Order, GatewayError> {
        self.submit_order(SubmitOrderRequest::market(symbol.clone(), side, size))
            .await
    }
}
