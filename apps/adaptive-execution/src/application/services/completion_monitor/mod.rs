//! Completion Monitor
//!
//! Waits for a set of orders to reach terminal status. Two strategies are
//! available and chosen once, at construction:
//!
//! - [`StreamingCompletionMonitor`]: push updates from the order stream,
//!   with slow polling as a backstop for missed events.
//! - [`PollingCompletionMonitor`]: bounded polling of the gateway.
//!
//! Both start with a synchronous status check so orders that are already
//! terminal resolve without waiting, and both report `Timeout` for ids still
//! open at the deadline.

mod polling;
mod streaming;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::application::ports::{OrderGatewayPort, OrderUpdate, OrderUpdateStreamPort};
use crate::domain::order_execution::{Order, OrderStatus};
use crate::domain::shared::OrderId;

pub use polling::PollingCompletionMonitor;
pub use streaming::StreamingCompletionMonitor;

/// Terminal state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// Terminal status.
    pub status: OrderStatus,
    /// Filled quantity at termination.
    pub filled_quantity: Decimal,
    /// Average fill price, if anything filled.
    pub avg_fill_price: Option<Decimal>,
}

impl From<&Order> for CompletionOutcome {
    fn from(order: &Order) -> Self {
        Self {
            status: order.status,
            filled_quantity: order.filled_quantity,
            avg_fill_price: order.avg_fill_price,
        }
    }
}

impl From<&OrderUpdate> for CompletionOutcome {
    fn from(update: &OrderUpdate) -> Self {
        Self {
            status: update.status,
            filled_quantity: update.filled_quantity,
            avg_fill_price: update.avg_fill_price,
        }
    }
}

/// Per-order result of a completion wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// The order reached a terminal status.
    Terminal(CompletionOutcome),
    /// The order was still open at the deadline.
    Timeout,
}

impl CompletionStatus {
    /// Returns true if the order settled.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// The terminal outcome, if any.
    #[must_use]
    pub const fn outcome(&self) -> Option<&CompletionOutcome> {
        match self {
            Self::Terminal(outcome) => Some(outcome),
            Self::Timeout => None,
        }
    }
}

/// Results of a completion wait, keyed by order id.
pub type CompletionMap = HashMap<OrderId, CompletionStatus>;

/// Stand-in deadline for waits too long to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `Instant::now() + wait`, saturating at [`FAR_FUTURE`] for waits such as
/// `Duration::MAX`.
pub(crate) fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait.min(FAR_FUTURE))
        .or_else(|| now.checked_add(Duration::from_secs(86_400)))
        .unwrap_or(now)
}

/// Completion monitor selected by stream availability.
pub enum CompletionMonitor<G: OrderGatewayPort> {
    /// Push-based with polling backstop.
    Streaming(StreamingCompletionMonitor<G>),
    /// Polling only.
    Polling(PollingCompletionMonitor<G>),
}

impl<G: OrderGatewayPort> CompletionMonitor<G> {
    /// Pick the streaming monitor when a stream is available, polling otherwise.
    ///
    /// `poll_interval` is the polling cadence; the streaming monitor uses
    /// `backstop_interval` for its slower safety-net polls.
    pub fn select(
        gateway: Arc<G>,
        stream: Option<Arc<dyn OrderUpdateStreamPort>>,
        poll_interval: Duration,
        backstop_interval: Duration,
    ) -> Self {
        match stream {
            Some(stream) => {
                tracing::info!("Using streaming completion monitor");
                Self::Streaming(StreamingCompletionMonitor::new(
                    gateway,
                    stream,
                    backstop_interval,
                ))
            }
            None => {
                tracing::info!(
                    poll_interval_ms = poll_interval.as_millis() as u64,
                    "No order update stream, using polling completion monitor"
                );
                Self::Polling(PollingCompletionMonitor::new(gateway, poll_interval))
            }
        }
    }

    /// Wait up to `max_wait` for every id to reach a terminal status.
    pub async fn await_completion(&self, order_ids: &[OrderId], max_wait: Duration) -> CompletionMap {
        let started = Instant::now();
        let results = match self {
            Self::Streaming(monitor) => monitor.await_completion(order_ids, max_wait).await,
            Self::Polling(monitor) => monitor.await_completion(order_ids, max_wait).await,
        };

        let timed_out = results.values().filter(|s| !s.is_settled()).count();
        crate::observability::record_completion_wait(
            self.kind(),
            started.elapsed().as_secs_f64(),
            timed_out,
        );
        results
    }

    /// Returns true iff every id settled within `max_wait`.
    pub async fn await_settlement(&self, order_ids: &[OrderId], max_wait: Duration) -> bool {
        let results = self.await_completion(order_ids, max_wait).await;
        let settled = results.values().filter(|s| s.is_settled()).count();
        let requested = results.len();

        if settled != requested {
            tracing::warn!(settled, requested, "Not all orders settled before deadline");
        }
        settled == requested
    }

    /// Short name of the strategy in use.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Streaming(_) => "streaming",
            Self::Polling(_) => "polling",
        }
    }
}

/// Bookkeeping shared by both strategies.
#[derive(Debug)]
struct PendingOrders {
    pending: Vec<OrderId>,
    results: CompletionMap,
}

impl PendingOrders {
    fn new(order_ids: &[OrderId]) -> Self {
        let mut pending: Vec<OrderId> = Vec::with_capacity(order_ids.len());
        for id in order_ids {
            if !pending.contains(id) {
                pending.push(id.clone());
            }
        }
        Self {
            pending,
            results: HashMap::with_capacity(order_ids.len()),
        }
    }

    fn ids(&self) -> &[OrderId] {
        &self.pending
    }

    fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Record a terminal outcome; ignores ids that are not pending.
    fn record(&mut self, order_id: &OrderId, outcome: CompletionOutcome) -> bool {
        let Some(pos) = self.pending.iter().position(|id| id == order_id) else {
            return false;
        };
        self.pending.swap_remove(pos);
        self.results
            .insert(order_id.clone(), CompletionStatus::Terminal(outcome));
        true
    }

    /// Query every pending id once and record the terminal ones.
    async fn poll<G: OrderGatewayPort>(&mut self, gateway: &G) {
        let ids = self.pending.clone();
        for id in ids {
            match gateway.get_order(&id).await {
                Ok(order) if order.is_terminal() => {
                    self.record(&id, CompletionOutcome::from(&order));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(order_id = %id, error = %e, "Order status query failed");
                }
            }
        }
    }

    /// Poll until done or `deadline`, sleeping `interval` between rounds.
    async fn poll_until<G: OrderGatewayPort>(
        &mut self,
        gateway: &G,
        deadline: Instant,
        interval: Duration,
    ) {
        while !self.is_done() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
            self.poll(gateway).await;
        }
    }

    /// Close out: every id still pending becomes `Timeout`.
    fn finish(mut self) -> CompletionMap {
        for id in self.pending.drain(..) {
            self.results.insert(id, CompletionStatus::Timeout);
        }
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::OrderSide;
    use crate::domain::shared::Symbol;
    use crate::infrastructure::broker::InMemoryGateway;
    use crate::infrastructure::websocket::InMemoryOrderStream;
    use rust_decimal_macros::dec;

    async fn resting_order(gateway: &InMemoryGateway) -> OrderId {
        gateway
            .submit_limit_order(&Symbol::new("AAPL"), OrderSide::Buy, dec!(10), dec!(100))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn select_prefers_stream() {
        let gateway = Arc::new(InMemoryGateway::new());
        let stream: Arc<dyn OrderUpdateStreamPort> = Arc::new(InMemoryOrderStream::new());

        let monitor = CompletionMonitor::select(
            Arc::clone(&gateway),
            Some(stream),
            Duration::from_millis(100),
            Duration::from_secs(1),
        );
        assert_eq!(monitor.kind(), "streaming");

        let monitor =
            CompletionMonitor::select(gateway, None, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(monitor.kind(), "polling");
    }

    #[tokio::test(start_paused = true)]
    async fn settlement_requires_every_order() {
        let gateway = Arc::new(InMemoryGateway::new());
        let filled = resting_order(&gateway).await;
        let open = resting_order(&gateway).await;
        gateway.fill_order(&filled, dec!(10), dec!(100));

        let monitor = CompletionMonitor::select(
            Arc::clone(&gateway),
            None,
            Duration::from_millis(100),
            Duration::from_secs(1),
        );

        assert!(monitor.await_settlement(&[filled.clone()], Duration::from_secs(1)).await);
        assert!(!monitor.await_settlement(&[filled, open], Duration::from_secs(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_waits_saturate() {
        let stream = Arc::new(InMemoryOrderStream::new());
        let gateway = Arc::new(InMemoryGateway::new().with_stream(Arc::clone(&stream)));
        let filled = resting_order(&gateway).await;
        gateway.fill_order(&filled, dec!(10), dec!(100));

        let polling = CompletionMonitor::select(
            Arc::clone(&gateway),
            None,
            Duration::from_millis(100),
            Duration::from_secs(1),
        );
        assert!(polling.await_settlement(&[filled.clone()], Duration::MAX).await);

        let stream: Arc<dyn OrderUpdateStreamPort> = stream;
        let streaming = CompletionMonitor::select(
            gateway,
            Some(stream),
            Duration::from_millis(100),
            Duration::from_secs(1),
        );
        assert!(streaming.await_settlement(&[filled], Duration::MAX).await);

        assert!(deadline_after(Duration::MAX) > Instant::now());
    }

    #[tokio::test]
    async fn settlement_of_nothing_is_true() {
        let gateway = Arc::new(InMemoryGateway::new());
        let monitor =
            CompletionMonitor::select(gateway, None, Duration::from_millis(100), Duration::from_secs(1));
        assert!(monitor.await_settlement(&[], Duration::from_secs(1)).await);
    }

    #[test]
    fn pending_orders_dedupes_and_times_out() {
        let a = OrderId::new("a");
        let b = OrderId::new("b");
        let mut pending = PendingOrders::new(&[a.clone(), b.clone(), a.clone()]);
        assert_eq!(pending.ids().len(), 2);

        let outcome = CompletionOutcome {
            status: OrderStatus::Canceled,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
        };
        assert!(pending.record(&a, outcome));
        assert!(!pending.record(&a, outcome));

        let results = pending.finish();
        assert_eq!(results.get(&a), Some(&CompletionStatus::Terminal(outcome)));
        assert_eq!(results.get(&b), Some(&CompletionStatus::Timeout));
    }
}
