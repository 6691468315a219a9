//! Order Update Stream Port (Driven Port)
//!
//! Push delivery of order status changes. One long-lived connection serves
//! many waiters; each waiter subscribes to the order ids it cares about and
//! receives only those updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::order_execution::{Order, OrderStatus};
use crate::domain::shared::OrderId;

/// A broker-reported change to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Order the update is about.
    pub order_id: OrderId,
    /// Status after the update.
    pub status: OrderStatus,
    /// Cumulative filled quantity.
    pub filled_quantity: Decimal,
    /// Average fill price so far.
    pub avg_fill_price: Option<Decimal>,
    /// Event time.
    pub timestamp: DateTime<Utc>,
}

impl From<&Order> for OrderUpdate {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            status: order.status,
            filled_quantity: order.filled_quantity,
            avg_fill_price: order.avg_fill_price,
            timestamp: order.updated_at,
        }
    }
}

/// Stream error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The stream is not connected.
    #[error("Order update stream not connected")]
    NotConnected,

    /// The stream has been shut down.
    #[error("Order update stream stopped")]
    Stopped,

    /// Subscription failed.
    #[error("Subscription error: {message}")]
    SubscriptionError {
        /// Error details.
        message: String,
    },
}

type Unregister = Box<dyn FnOnce() + Send>;

/// Receiving half of a subscription.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// deregisters it from the stream.
pub struct OrderUpdateSubscription {
    receiver: mpsc::UnboundedReceiver<OrderUpdate>,
    unregister: Option<Unregister>,
}

impl OrderUpdateSubscription {
    /// Wrap a receiver with the callback that deregisters it.
    pub fn new(
        receiver: mpsc::UnboundedReceiver<OrderUpdate>,
        unregister: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            unregister: Some(Box::new(unregister)),
        }
    }

    /// Next update, or `None` once the stream side has gone away.
    pub async fn recv(&mut self) -> Option<OrderUpdate> {
        self.receiver.recv().await
    }

    /// Deregister explicitly.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for OrderUpdateSubscription {
    fn drop(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

impl std::fmt::Debug for OrderUpdateSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderUpdateSubscription")
            .field("registered", &self.unregister.is_some())
            .finish_non_exhaustive()
    }
}

/// Port for push-based order status updates.
#[async_trait]
pub trait OrderUpdateStreamPort: Send + Sync {
    /// Register interest in `order_ids`.
    async fn subscribe(&self, order_ids: &[OrderId])
    -> Result<OrderUpdateSubscription, StreamError>;

    /// Whether the underlying connection is currently up.
    fn is_connected(&self) -> bool;

    /// Shut the connection down.
    async fn stop(&self);
}
