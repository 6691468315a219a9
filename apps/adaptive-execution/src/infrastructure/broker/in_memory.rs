//! In-memory order gateway.
//!
//! Deterministic stand-in for a broker, used by tests and dry runs. Orders
//! rest, fill or reject according to configurable rules, and every status
//! change is optionally pushed to an [`InMemoryOrderStream`].

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{GatewayError, OrderGatewayPort, OrderUpdate, SubmitOrderRequest};
use crate::domain::order_execution::{Order, OrderSize, OrderStatus, OrderType};
use crate::domain::position_sizing::AssetInfo;
use crate::domain::shared::{OrderId, Symbol};
use crate::infrastructure::websocket::InMemoryOrderStream;

/// How a newly submitted order behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// Rest until filled or canceled by hand.
    Rest,
    /// Fill completely on submission.
    FillImmediately,
    /// Fill completely on the nth submission of this order type (1-based);
    /// earlier ones rest.
    FillOnSubmission(u32),
}

#[derive(Debug)]
struct GatewayState {
    orders: HashMap<OrderId, Order>,
    positions: HashMap<Symbol, Decimal>,
    assets: HashMap<Symbol, AssetInfo>,
    limit_rule: FillRule,
    market_rule: FillRule,
    market_price: Option<Decimal>,
    submit_errors: VecDeque<GatewayError>,
    fill_on_cancel: Option<Decimal>,
    ignore_cancels: bool,
    submissions: Vec<SubmitOrderRequest>,
    cancels: Vec<OrderId>,
    limit_count: u32,
    market_count: u32,
}

/// In-memory implementation of [`OrderGatewayPort`].
#[derive(Debug)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
    stream: Option<Arc<InMemoryOrderStream>>,
    next_id: AtomicU64,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Create a gateway where limit orders rest and market orders fill.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GatewayState {
                orders: HashMap::new(),
                positions: HashMap::new(),
                assets: HashMap::new(),
                limit_rule: FillRule::Rest,
                market_rule: FillRule::FillImmediately,
                market_price: None,
                submit_errors: VecDeque::new(),
                fill_on_cancel: None,
                ignore_cancels: false,
                submissions: Vec::new(),
                cancels: Vec::new(),
                limit_count: 0,
                market_count: 0,
            }),
            stream: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Push every status change to `stream`.
    #[must_use]
    pub fn with_stream(mut self, stream: Arc<InMemoryOrderStream>) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Behaviour of new limit orders.
    pub fn set_limit_fill_rule(&self, rule: FillRule) {
        self.state.lock().limit_rule = rule;
    }

    /// Behaviour of new market orders.
    pub fn set_market_fill_rule(&self, rule: FillRule) {
        self.state.lock().market_rule = rule;
    }

    /// Fill price for market orders.
    pub fn set_market_price(&self, price: Decimal) {
        self.state.lock().market_price = Some(price);
    }

    /// Fail the next submission with `error`. Errors queue up in order.
    pub fn push_submit_error(&self, error: GatewayError) {
        self.state.lock().submit_errors.push_back(error);
    }

    /// Quantity that fills while a cancel is in flight.
    pub fn set_fill_on_cancel(&self, quantity: Option<Decimal>) {
        self.state.lock().fill_on_cancel = quantity;
    }

    /// Accept cancel requests without canceling anything.
    pub fn set_ignore_cancels(&self, ignore: bool) {
        self.state.lock().ignore_cancels = ignore;
    }

    /// Held quantity for a symbol.
    pub fn set_position(&self, symbol: &Symbol, quantity: Decimal) {
        self.state.lock().positions.insert(symbol.clone(), quantity);
    }

    /// Asset facts for a symbol. Unknown symbols are fractionable.
    pub fn set_asset_info(&self, info: AssetInfo) {
        self.state.lock().assets.insert(info.symbol.clone(), info);
    }

    /// Every accepted or failed submission, in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<SubmitOrderRequest> {
        self.state.lock().submissions.clone()
    }

    /// Limit prices of submitted limit orders, in order.
    #[must_use]
    pub fn limit_prices(&self) -> Vec<Decimal> {
        self.state
            .lock()
            .submissions
            .iter()
            .filter_map(|s| s.limit_price)
            .collect()
    }

    /// Ids passed to `cancel_order`, in order.
    #[must_use]
    pub fn cancels(&self) -> Vec<OrderId> {
        self.state.lock().cancels.clone()
    }

    /// Current snapshot of an order.
    #[must_use]
    pub fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.state.lock().orders.get(order_id).cloned()
    }

    /// Orders that are not yet terminal.
    #[must_use]
    pub fn open_orders(&self) -> Vec<Order> {
        self.state
            .lock()
            .orders
            .values()
            .filter(|o| !o.is_terminal())
            .cloned()
            .collect()
    }

    /// Fill an order up to `filled_quantity` (cumulative) at `avg_price`.
    ///
    /// Returns false if the order is unknown or already terminal.
    pub fn fill_order(&self, order_id: &OrderId, filled_quantity: Decimal, avg_price: Decimal) -> bool {
        let update = {
            let mut state = self.state.lock();
            let Some(order) = state.orders.get_mut(order_id) else {
                return false;
            };
            Self::apply(order, OrderStatus::PartiallyFilled, filled_quantity, Some(avg_price))
        };
        self.publish(update)
    }

    fn next_order_id(&self) -> OrderId {
        OrderId::new(format!("mem-{}", self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    /// Apply a status change, returning the update to publish if it took.
    fn apply(
        order: &mut Order,
        status: OrderStatus,
        filled_quantity: Decimal,
        avg_fill_price: Option<Decimal>,
    ) -> Option<OrderUpdate> {
        match order.apply_update(status, filled_quantity, avg_fill_price, Utc::now()) {
            Ok(true) => Some(OrderUpdate::from(&*order)),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Rejected simulated fill");
                None
            }
        }
    }

    fn publish(&self, update: Option<OrderUpdate>) -> bool {
        let Some(update) = update else {
            return false;
        };
        if let Some(stream) = &self.stream {
            stream.publish(update);
        }
        true
    }

    fn should_fill(rule: FillRule, count: u32) -> bool {
        match rule {
            FillRule::Rest => false,
            FillRule::FillImmediately => true,
            FillRule::FillOnSubmission(n) => count >= n,
        }
    }
}

#[async_trait]
impl OrderGatewayPort for InMemoryGateway {
    async fn submit_order(&self, request: SubmitOrderRequest) -> Result<Order, GatewayError> {
        let order_id = self.next_order_id();

        let (order, update) = {
            let mut state = self.state.lock();
            state.submissions.push(request.clone());
            if let Some(error) = state.submit_errors.pop_front() {
                return Err(error);
            }

            let now = Utc::now();
            let (quantity, notional) = match request.size {
                OrderSize::Shares(qty) => (qty, None),
                OrderSize::Notional(amount) => (Decimal::ZERO, Some(amount)),
            };

            let mut order = Order {
                id: order_id.clone(),
                client_order_id: Some(request.client_order_id.clone()),
                symbol: request.symbol.clone(),
                side: request.side,
                quantity,
                notional,
                order_type: request.order_type,
                limit_price: request.limit_price,
                time_in_force: request.time_in_force,
                status: OrderStatus::New,
                filled_quantity: Decimal::ZERO,
                avg_fill_price: None,
                created_at: now,
                updated_at: now,
            };

            let (fill, price) = match request.order_type {
                OrderType::Limit => {
                    state.limit_count += 1;
                    (
                        Self::should_fill(state.limit_rule, state.limit_count),
                        request.limit_price,
                    )
                }
                OrderType::Market => {
                    state.market_count += 1;
                    (
                        Self::should_fill(state.market_rule, state.market_count),
                        state.market_price,
                    )
                }
            };

            let fill_quantity = match (notional, price) {
                (None, _) => Some(quantity),
                (Some(amount), Some(price)) if price > Decimal::ZERO => {
                    let shares = (amount / price).round_dp(6);
                    order.quantity = shares;
                    Some(shares)
                }
                (Some(_), _) => None,
            };

            let update = match fill_quantity {
                Some(qty) if fill => Self::apply(&mut order, OrderStatus::Filled, qty, price),
                _ => None,
            };

            state.orders.insert(order_id, order.clone());
            (order, update)
        };

        self.publish(update);
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), GatewayError> {
        let update = {
            let mut state = self.state.lock();
            state.cancels.push(order_id.clone());
            let ignore = state.ignore_cancels;
            let fill_on_cancel = state.fill_on_cancel;

            let Some(order) = state.orders.get_mut(order_id) else {
                return Err(GatewayError::OrderNotFound {
                    order_id: order_id.to_string(),
                });
            };
            if order.is_terminal() {
                return Err(GatewayError::OrderRejected {
                    reason: format!("order is already {}", order.status),
                });
            }
            if ignore {
                return Ok(());
            }

            let filled = fill_on_cancel
                .map_or(order.filled_quantity, |qty| qty.min(order.quantity).max(order.filled_quantity));
            let price = order.limit_price;
            if filled >= order.quantity && order.quantity > Decimal::ZERO {
                Self::apply(order, OrderStatus::Filled, filled, price)
            } else {
                Self::apply(order, OrderStatus::Canceled, filled, price.filter(|_| filled > Decimal::ZERO))
            }
        };

        self.publish(update);
        Ok(())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, GatewayError> {
        self.order(order_id).ok_or_else(|| GatewayError::OrderNotFound {
            order_id: order_id.to_string(),
        })
    }

    async fn get_position(&self, symbol: &Symbol) -> Result<Decimal, GatewayError> {
        Ok(self
            .state
            .lock()
            .positions
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn get_asset_info(&self, symbol: &Symbol) -> Result<AssetInfo, GatewayError> {
        Ok(self
            .state
            .lock()
            .assets
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| AssetInfo::new(symbol.clone(), true)))
    }
}
