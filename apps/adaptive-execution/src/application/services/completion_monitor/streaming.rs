//! Streaming completion monitor.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::{CompletionMap, CompletionOutcome, PendingOrders, deadline_after};
use crate::application::ports::{OrderGatewayPort, OrderUpdateStreamPort};
use crate::domain::shared::OrderId;

/// Waits on pushed order updates, polling the gateway now and then in case
/// an event was missed.
pub struct StreamingCompletionMonitor<G: OrderGatewayPort> {
    gateway: Arc<G>,
    stream: Arc<dyn OrderUpdateStreamPort>,
    backstop_interval: Duration,
}

impl<G: OrderGatewayPort> StreamingCompletionMonitor<G> {
    /// Create a streaming monitor.
    pub fn new(
        gateway: Arc<G>,
        stream: Arc<dyn OrderUpdateStreamPort>,
        backstop_interval: Duration,
    ) -> Self {
        Self {
            gateway,
            stream,
            backstop_interval,
        }
    }

    /// Wait up to `max_wait` for every id to reach a terminal status.
    ///
    /// No subscription is opened when every id is already terminal. If the
    /// subscription cannot be opened the wait degrades to polling.
    pub async fn await_completion(&self, order_ids: &[OrderId], max_wait: Duration) -> CompletionMap {
        let deadline = deadline_after(max_wait);
        let gateway = self.gateway.as_ref();
        let mut pending = PendingOrders::new(order_ids);

        pending.poll(gateway).await;
        if pending.is_done() {
            return pending.finish();
        }

        let mut subscription = match self.stream.subscribe(pending.ids()).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!(error = %e, "Order update subscription failed, polling instead");
                pending
                    .poll_until(gateway, deadline, self.backstop_interval)
                    .await;
                return pending.finish();
            }
        };

        // An update may have landed between the status check and the subscription
        pending.poll(gateway).await;

        let mut backstop =
            tokio::time::interval_at(deadline_after(self.backstop_interval), self.backstop_interval);
        backstop.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expiry = tokio::time::sleep_until(deadline);
        tokio::pin!(expiry);
        let mut stream_open = true;

        while !pending.is_done() {
            tokio::select! {
                update = subscription.recv(), if stream_open => match update {
                    Some(update) if update.status.is_terminal() => {
                        pending.record(&update.order_id, CompletionOutcome::from(&update));
                    }
                    Some(_) => {}
                    None => {
                        tracing::warn!("Order update stream closed, relying on polling");
                        stream_open = false;
                    }
                },
                _ = backstop.tick() => pending.poll(gateway).await,
                () = &mut expiry => break,
            }
        }

        subscription.unsubscribe();
        pending.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;
    use crate::application::services::completion_monitor::CompletionStatus;
    use crate::domain::order_execution::{OrderSide, OrderStatus};
    use crate::domain::shared::Symbol;
    use crate::infrastructure::broker::InMemoryGateway;
    use crate::infrastructure::websocket::InMemoryOrderStream;
    use rust_decimal_macros::dec;

    fn monitor(
        gateway: &Arc<InMemoryGateway>,
        stream: &Arc<InMemoryOrderStream>,
    ) -> StreamingCompletionMonitor<InMemoryGateway> {
        let stream: Arc<dyn OrderUpdateStreamPort> = stream.clone();
        StreamingCompletionMonitor::new(Arc::clone(gateway), stream, Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_orders_resolve_without_subscribing() {
        let stream = Arc::new(InMemoryOrderStream::new());
        let gateway = Arc::new(InMemoryGateway::new().with_stream(Arc::clone(&stream)));
        let order = gateway
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(10), dec!(190))
            .await
            .unwrap();
        gateway.fill_order(&order.id, dec!(10), dec!(189.95));

        let results = monitor(&gateway, &stream)
            .await_completion(&[order.id.clone()], Duration::from_secs(5))
            .await;

        assert!(results[&order.id].is_settled());
        assert_eq!(stream.subscribe_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pushed_fill_resolves_wait() {
        let stream = Arc::new(InMemoryOrderStream::new());
        let gateway = Arc::new(InMemoryGateway::new().with_stream(Arc::clone(&stream)));
        let order = gateway
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(10), dec!(190))
            .await
            .unwrap();

        let filler = Arc::clone(&gateway);
        let id = order.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            filler.fill_order(&id, dec!(10), dec!(189.99));
        });

        let started = Instant::now();
        let results = monitor(&gateway, &stream)
            .await_completion(&[order.id.clone()], Duration::from_secs(30))
            .await;

        let outcome = results[&order.id].outcome().copied().unwrap();
        assert_eq!(outcome.status, OrderStatus::Filled);
        assert_eq!(stream.subscribe_calls(), 1);
        // Resolved by the push, well before the first backstop poll
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(stream.active_subscriptions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn backstop_catches_missed_event() {
        let stream = Arc::new(InMemoryOrderStream::new());
        // Gateway not wired to the stream: fills are never pushed
        let gateway = Arc::new(InMemoryGateway::new());
        let order = gateway
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Sell, dec!(3), dec!(190))
            .await
            .unwrap();

        let filler = Arc::clone(&gateway);
        let id = order.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            filler.fill_order(&id, dec!(3), dec!(190));
        });

        let results = monitor(&gateway, &stream)
            .await_completion(&[order.id.clone()], Duration::from_secs(30))
            .await;
        assert!(results[&order.id].is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_subscription_degrades_to_polling() {
        let stream = Arc::new(InMemoryOrderStream::new());
        stream.set_fail_subscriptions(true);
        let gateway = Arc::new(InMemoryGateway::new());
        let order = gateway
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(1), dec!(190))
            .await
            .unwrap();

        let results = monitor(&gateway, &stream)
            .await_completion(&[order.id.clone()], Duration::from_secs(3))
            .await;
        assert_eq!(results[&order.id], CompletionStatus::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_ids_resolve_independently() {
        let stream = Arc::new(InMemoryOrderStream::new());
        let gateway = Arc::new(InMemoryGateway::new().with_stream(Arc::clone(&stream)));
        let done = gateway
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(1), dec!(190))
            .await
            .unwrap();
        let open = gateway
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(1), dec!(190))
            .await
            .unwrap();
        gateway.fill_order(&done.id, dec!(1), dec!(190));

        let results = monitor(&gateway, &stream)
            .await_completion(&[done.id.clone(), open.id.clone()], Duration::from_secs(5))
            .await;

        assert!(results[&done.id].is_settled());
        assert_eq!(results[&open.id], CompletionStatus::Timeout);
    }
}
