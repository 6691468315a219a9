//! In-memory order update stream for tests and offline runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::router::OrderUpdateRouter;
use crate::application::ports::{
    OrderUpdate, OrderUpdateStreamPort, OrderUpdateSubscription, StreamError,
};
use crate::domain::shared::OrderId;

/// Order update stream fed by [`publish`](Self::publish) instead of a socket.
#[derive(Debug)]
pub struct InMemoryOrderStream {
    router: Arc<OrderUpdateRouter>,
    subscribe_calls: AtomicUsize,
    fail_subscriptions: AtomicBool,
    stopped: AtomicBool,
}

impl InMemoryOrderStream {
    /// Create a connected stream with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: OrderUpdateRouter::new(),
            subscribe_calls: AtomicUsize::new(0),
            fail_subscriptions: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Push an update to interested subscribers; returns how many received it.
    pub fn publish(&self, update: OrderUpdate) -> usize {
        if self.stopped.load(Ordering::SeqCst) {
            return 0;
        }
        self.router.dispatch(&update)
    }

    /// Make subsequent `subscribe` calls fail.
    pub fn set_fail_subscriptions(&self, fail: bool) {
        self.fail_subscriptions.store(fail, Ordering::SeqCst);
    }

    /// Number of `subscribe` calls so far, failed ones included.
    #[must_use]
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Subscriptions not yet dropped.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.router.waiter_count()
    }
}

impl Default for InMemoryOrderStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderUpdateStreamPort for InMemoryOrderStream {
    async fn subscribe(
        &self,
        order_ids: &[OrderId],
    ) -> Result<OrderUpdateSubscription, StreamError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.stopped.load(Ordering::SeqCst) {
            return Err(StreamError::Stopped);
        }
        if self.fail_subscriptions.load(Ordering::SeqCst) {
            return Err(StreamError::SubscriptionError {
                message: "simulated subscription failure".to_string(),
            });
        }
        Ok(self.router.register(order_ids))
    }

    fn is_connected(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.router.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::order_execution::OrderStatus;

    fn filled(id: &str) -> OrderUpdate {
        OrderUpdate {
            order_id: OrderId::new(id),
            status: OrderStatus::Filled,
            filled_quantity: dec!(5),
            avg_fill_price: Some(dec!(10)),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let stream = InMemoryOrderStream::new();
        let mut sub = stream.subscribe(&[OrderId::new("o-1")]).await.unwrap();

        assert_eq!(stream.publish(filled("o-1")), 1);
        assert_eq!(sub.recv().await.unwrap().filled_quantity, dec!(5));
        assert_eq!(stream.subscribe_calls(), 1);
        assert_eq!(stream.active_subscriptions(), 1);

        sub.unsubscribe();
        assert_eq!(stream.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn failing_subscriptions_are_counted() {
        let stream = InMemoryOrderStream::new();
        stream.set_fail_subscriptions(true);

        assert!(stream.subscribe(&[OrderId::new("o-1")]).await.is_err());
        assert_eq!(stream.subscribe_calls(), 1);
        assert_eq!(stream.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn stop_disconnects() {
        let stream = InMemoryOrderStream::new();
        let mut sub = stream.subscribe(&[OrderId::new("o-1")]).await.unwrap();

        stream.stop().await;

        assert!(!stream.is_connected());
        assert!(sub.recv().await.is_none());
        assert_eq!(stream.publish(filled("o-1")), 0);
        assert!(matches!(
            stream.subscribe(&[OrderId::new("o-1")]).await,
            Err(StreamError::Stopped)
        ));
    }
}
