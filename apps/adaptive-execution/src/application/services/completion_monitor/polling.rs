//! Polling completion monitor.

use std::sync::Arc;
use std::time::Duration;

use super::{CompletionMap, PendingOrders, deadline_after};
use crate::application::ports::OrderGatewayPort;
use crate::domain::shared::OrderId;

/// Polls the gateway at a fixed interval until every order settles or the
/// deadline passes.
pub struct PollingCompletionMonitor<G: OrderGatewayPort> {
    gateway: Arc<G>,
    poll_interval: Duration,
}

impl<G: OrderGatewayPort> PollingCompletionMonitor<G> {
    /// Create a polling monitor.
    pub const fn new(gateway: Arc<G>, poll_interval: Duration) -> Self {
        Self {
            gateway,
            poll_interval,
        }
    }

    /// Wait up to `max_wait` for every id to reach a terminal status.
    pub async fn await_completion(&self, order_ids: &[OrderId], max_wait: Duration) -> CompletionMap {
        let deadline = deadline_after(max_wait);
        let mut pending = PendingOrders::new(order_ids);

        pending.poll(self.gateway.as_ref()).await;
        pending
            .poll_until(self.gateway.as_ref(), deadline, self.poll_interval)
            .await;
        pending.finish()
    }
}
