//! Order update fan-out.
//!
//! One connection carries updates for every order; the router hands each
//! update to the waiters registered for that order id.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::application::ports::{OrderUpdate, OrderUpdateSubscription};
use crate::domain::shared::OrderId;

type WaiterId = u64;

#[derive(Debug, Default)]
struct Registry {
    next_id: WaiterId,
    senders: HashMap<WaiterId, mpsc::UnboundedSender<OrderUpdate>>,
    waiter_orders: HashMap<WaiterId, HashSet<OrderId>>,
    by_order: HashMap<OrderId, HashSet<WaiterId>>,
}

/// Routes order updates to subscribed waiters.
#[derive(Debug, Default)]
pub struct OrderUpdateRouter {
    registry: Mutex<Registry>,
}

impl OrderUpdateRouter {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a waiter for `order_ids`.
    ///
    /// The returned subscription deregisters itself when dropped.
    pub fn register(self: &Arc<Self>, order_ids: &[OrderId]) -> OrderUpdateSubscription {
        let (tx, rx) = mpsc::unbounded_channel();

        let waiter = {
            let mut registry = self.registry.lock();
            let waiter = registry.next_id;
            registry.next_id += 1;

            let ids: HashSet<OrderId> = order_ids.iter().cloned().collect();
            for id in &ids {
                registry
                    .by_order
                    .entry(id.clone())
                    .or_default()
                    .insert(waiter);
            }
            registry.waiter_orders.insert(waiter, ids);
            registry.senders.insert(waiter, tx);
            waiter
        };

        let router: Weak<Self> = Arc::downgrade(self);
        OrderUpdateSubscription::new(rx, move || {
            if let Some(router) = router.upgrade() {
                router.unregister(waiter);
            }
        })
    }

    fn unregister(&self, waiter: WaiterId) {
        let mut registry = self.registry.lock();
        registry.senders.remove(&waiter);
        let Some(ids) = registry.waiter_orders.remove(&waiter) else {
            return;
        };
        for id in ids {
            if let Some(waiters) = registry.by_order.get_mut(&id) {
                waiters.remove(&waiter);
                if waiters.is_empty() {
                    registry.by_order.remove(&id);
                }
            }
        }
    }

    /// Deliver `update` to every waiter interested in its order.
    ///
    /// Returns the number of waiters reached.
    pub fn dispatch(&self, update: &OrderUpdate) -> usize {
        let registry = self.registry.lock();
        let Some(waiters) = registry.by_order.get(&update.order_id) else {
            return 0;
        };

        waiters
            .iter()
            .filter_map(|w| registry.senders.get(w))
            .filter(|tx| tx.send(update.clone()).is_ok())
            .count()
    }

    /// Registered waiters.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.registry.lock().senders.len()
    }

    /// Distinct order ids with at least one waiter.
    #[must_use]
    pub fn interest_count(&self) -> usize {
        self.registry.lock().by_order.len()
    }

    /// Drop every waiter; their receivers observe end-of-stream.
    pub fn clear(&self) {
        let mut registry = self.registry.lock();
        registry.senders.clear();
        registry.waiter_orders.clear();
        registry.by_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::order_execution::OrderStatus;

    fn update(id: &str, status: OrderStatus) -> OrderUpdate {
        OrderUpdate {
            order_id: OrderId::new(id),
            status,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_only_to_interested_waiters() {
        let router = OrderUpdateRouter::new();
        let mut a = router.register(&[OrderId::new("o-1")]);
        let mut b = router.register(&[OrderId::new("o-2")]);

        assert_eq!(router.dispatch(&update("o-1", OrderStatus::Filled)), 1);
        assert_eq!(a.recv().await.unwrap().order_id.as_str(), "o-1");
        let pending = tokio::time::timeout(Duration::from_millis(10), b.recv()).await;
        assert!(pending.is_err());

        assert_eq!(router.dispatch(&update("o-3", OrderStatus::Filled)), 0);
    }

    #[tokio::test]
    async fn shared_order_reaches_every_waiter() {
        let router = OrderUpdateRouter::new();
        let mut a = router.register(&[OrderId::new("o-1")]);
        let mut b = router.register(&[OrderId::new("o-1"), OrderId::new("o-2")]);

        assert_eq!(router.dispatch(&update("o-1", OrderStatus::Canceled)), 2);
        assert_eq!(a.recv().await.unwrap().status, OrderStatus::Canceled);
        assert_eq!(b.recv().await.unwrap().status, OrderStatus::Canceled);
        assert_eq!(router.interest_count(), 2);
    }

    #[test]
    fn drop_deregisters() {
        let router = OrderUpdateRouter::new();
        let a = router.register(&[OrderId::new("o-1")]);
        let b = router.register(&[OrderId::new("o-1")]);
        assert_eq!(router.waiter_count(), 2);

        drop(a);
        assert_eq!(router.waiter_count(), 1);
        assert_eq!(router.interest_count(), 1);

        b.unsubscribe();
        assert_eq!(router.waiter_count(), 0);
        assert_eq!(router.interest_count(), 0);
    }

    #[tokio::test]
    async fn clear_closes_receivers() {
        let router = OrderUpdateRouter::new();
        let mut sub = router.register(&[OrderId::new("o-1")]);

        router.clear();
        assert!(sub.recv().await.is_none());
        drop(sub);
        assert_eq!(router.waiter_count(), 0);
    }

    #[test]
    fn subscription_outliving_router_is_harmless() {
        let router = OrderUpdateRouter::new();
        let sub = router.register(&[OrderId::new("o-1")]);
        drop(router);
        drop(sub);
    }
}
