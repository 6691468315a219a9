//! Attempt sequence: limit attempts, repegs and market fallback.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::time::Instant;

use super::ExecuteTradeUseCase;
use crate::application::ports::{OrderGatewayPort, Quote, QuoteSourcePort};
use crate::application::services::CompletionOutcome;
use crate::application::services::completion_monitor::deadline_after;
use crate::domain::execution_tactics::{AttemptState, RepricingPlanner};
use crate::domain::order_execution::{
    ErrorKind, ExecutionError, ExecutionResult, OrderSide, OrderSize, OrderStatus,
};
use crate::domain::shared::{OrderId, Symbol};

/// States an execution sequence moves through.
///
/// `AssessingTiming -> AwaitingFill -> Filled | Repeg -> AwaitingFill | Exhausted`,
/// with `Exhausted` and `VolatilityPaused` leading to `MarketFallback` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPhase {
    /// Classifying the spread and waiting out the open if advised.
    AssessingTiming,
    /// A limit order is working.
    AwaitingFill,
    /// Repricing and resubmitting the unfilled remainder.
    Repeg,
    /// Requested quantity filled.
    Filled,
    /// Limit attempts used up.
    Exhausted,
    /// Spread widened past the pause threshold.
    VolatilityPaused,
    /// Market order for the remainder.
    MarketFallback,
    /// Sequence ended without filling.
    Failed,
}

impl ExecutionPhase {
    /// Snake-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AssessingTiming => "assessing_timing",
            Self::AwaitingFill => "awaiting_fill",
            Self::Repeg => "repeg",
            Self::Filled => "filled",
            Self::Exhausted => "exhausted",
            Self::VolatilityPaused => "volatility_paused",
            Self::MarketFallback => "market_fallback",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable progress of one sequence.
#[derive(Debug)]
pub(super) struct Sequence {
    symbol: Symbol,
    side: OrderSide,
    requested: Decimal,
    filled: Decimal,
    priced_quantity: Decimal,
    filled_notional: Decimal,
    last_order_id: Option<OrderId>,
    last_status: Option<OrderStatus>,
    attempts: u32,
    used_market_fallback: bool,
    submitted_at: DateTime<Utc>,
}

impl Sequence {
    pub(super) fn new(
        symbol: Symbol,
        side: OrderSide,
        requested: Decimal,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol,
            side,
            requested,
            filled: Decimal::ZERO,
            priced_quantity: Decimal::ZERO,
            filled_notional: Decimal::ZERO,
            last_order_id: None,
            last_status: None,
            attempts: 0,
            used_market_fallback: false,
            submitted_at,
        }
    }

    fn remaining(&self) -> Decimal {
        (self.requested - self.filled).max(Decimal::ZERO)
    }

    fn is_complete(&self) -> bool {
        self.filled >= self.requested
    }

    fn record_submission(&mut self, order_id: OrderId) {
        self.attempts += 1;
        self.last_order_id = Some(order_id);
        self.last_status = None;
    }

    /// Fold a terminal order into the running totals.
    ///
    /// `fallback_price` stands in for a missing average fill price.
    fn record_outcome(&mut self, outcome: &CompletionOutcome, fallback_price: Option<Decimal>) {
        self.last_status = Some(outcome.status);
        if outcome.filled_quantity <= Decimal::ZERO {
            return;
        }
        self.filled += outcome.filled_quantity;
        if let Some(price) = outcome.avg_fill_price.or(fallback_price) {
            self.priced_quantity += outcome.filled_quantity;
            self.filled_notional += outcome.filled_quantity * price;
        }
    }

    fn avg_fill_price(&self) -> Option<Decimal> {
        (self.priced_quantity > Decimal::ZERO).then(|| self.filled_notional / self.priced_quantity)
    }

    fn into_result(self, now: DateTime<Utc>, error: Option<&ExecutionError>) -> ExecutionResult {
        let avg_fill_price = self.avg_fill_price();
        ExecutionResult {
            success: error.is_none(),
            symbol: self.symbol,
            side: self.side,
            requested_quantity: self.requested,
            order_id: self.last_order_id,
            terminal_status: self.last_status,
            filled_quantity: self.filled,
            avg_fill_price,
            attempts: self.attempts,
            used_market_fallback: self.used_market_fallback,
            submitted_at: self.submitted_at,
            completed_at: self.last_status.map(|_| now),
            error: error.map(|e| e.message.clone()),
            error_kind: error.map(|e| e.kind),
        }
    }
}

fn log_transition(
    phase: ExecutionPhase,
    seq: &Sequence,
    attempt: Option<u32>,
    price: Option<Decimal>,
    reason: &str,
) {
    match phase {
        ExecutionPhase::Exhausted | ExecutionPhase::VolatilityPaused | ExecutionPhase::Failed => {
            tracing::warn!(
                phase = %phase,
                symbol = %seq.symbol,
                side = %seq.side,
                quantity = %seq.remaining(),
                filled = %seq.filled,
                attempt = ?attempt,
                price = ?price,
                reason,
                "Execution transition"
            );
        }
        _ => {
            tracing::info!(
                phase = %phase,
                symbol = %seq.symbol,
                side = %seq.side,
                quantity = %seq.remaining(),
                filled = %seq.filled,
                attempt = ?attempt,
                price = ?price,
                reason,
                "Execution transition"
            );
        }
    }
}

impl<G, Q> ExecuteTradeUseCase<G, Q>
where
    G: OrderGatewayPort,
    Q: QuoteSourcePort,
{
    /// Run the limit sequence, then market fallback if it cannot finish.
    pub(super) async fn run_sequence(&self, mut seq: Sequence) -> ExecutionResult {
        let deadline = deadline_after(self.config.max_total_wait);

        let Some(quote) = self.valid_quote(&seq.symbol).await else {
            let err = ExecutionError::price_unavailable(format!("no valid quote for {}", seq.symbol));
            log_transition(ExecutionPhase::AssessingTiming, &seq, None, None, &err.message);
            return self.finish_unfilled(seq, err).await;
        };
        let quote = self.assess_timing(&seq, quote, deadline).await;
        let mut state = AttemptState::new(seq.symbol.clone(), seq.side, quote.bid, quote.ask);

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                if let Some(quote) = self.valid_quote(&seq.symbol).await {
                    state.update_quote(quote.bid, quote.ask);
                }

                if RepricingPlanner::should_pause_for_volatility(
                    state.original_spread(),
                    state.current_spread(),
                    &self.config,
                ) {
                    let err = ExecutionError::volatility_pause(format!(
                        "spread widened from {} to {}",
                        state.original_spread(),
                        state.current_spread()
                    ));
                    log_transition(
                        ExecutionPhase::VolatilityPaused,
                        &seq,
                        Some(attempt),
                        None,
                        &err.message,
                    );
                    return self.finish_unfilled(seq, err).await;
                }

                if let Some(ready_at) = state
                    .last_attempt_time()
                    .and_then(|last| last.checked_add(self.config.min_repeg_interval))
                {
                    if ready_at > Instant::now() {
                        tokio::time::sleep_until(ready_at).await;
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                log_transition(
                    ExecutionPhase::Exhausted,
                    &seq,
                    Some(attempt),
                    None,
                    "maximum total wait reached",
                );
                break;
            }

            let price = RepricingPlanner::price_for_attempt(&state, attempt, &self.config);
            let timeout = RepricingPlanner::timeout(attempt, &self.config).min(deadline - now);
            let quantity = seq.remaining();

            if attempt > 0 {
                log_transition(
                    ExecutionPhase::Repeg,
                    &seq,
                    Some(attempt),
                    Some(price),
                    "previous attempt unfilled",
                );
                crate::observability::record_repeg(seq.symbol.as_str());
            }

            let order = match self
                .gateway
                .submit_limit_order(&seq.symbol, seq.side, quantity, price)
                .await
            {
                Ok(order) => {
                    crate::observability::record_order_submission("limit", true);
                    order
                }
                Err(e) => {
                    crate::observability::record_order_submission("limit", false);
                    let err = ExecutionError::from(e);
                    tracing::warn!(
                        symbol = %seq.symbol,
                        attempt,
                        price = %price,
                        error = %err,
                        "Limit order submission failed"
                    );
                    return self.finish_unfilled(seq, err).await;
                }
            };

            state.mark_attempt(Instant::now());
            seq.record_submission(order.id.clone());
            log_transition(
                ExecutionPhase::AwaitingFill,
                &seq,
                Some(attempt),
                Some(price),
                "limit order working",
            );

            let outcome = match self.await_order(&order.id, timeout).await {
                Some(outcome) => outcome,
                None => match self.cancel_and_confirm(&order.id).await {
                    Some(outcome) => outcome,
                    None => {
                        let err = ExecutionError::timeout(format!(
                            "cancellation of order {} not confirmed",
                            order.id
                        ));
                        log_transition(
                            ExecutionPhase::Failed,
                            &seq,
                            Some(attempt),
                            Some(price),
                            &err.message,
                        );
                        return seq.into_result(self.clock.now(), Some(&err));
                    }
                },
            };
            seq.record_outcome(&outcome, Some(price));

            if seq.is_complete() || outcome.status == OrderStatus::Filled {
                log_transition(
                    ExecutionPhase::Filled,
                    &seq,
                    Some(attempt),
                    Some(price),
                    "limit order filled",
                );
                return seq.into_result(self.clock.now(), None);
            }
        }

        let err = ExecutionError::timeout(format!(
            "{} limit attempts left {} unfilled",
            seq.attempts,
            seq.remaining()
        ));
        log_transition(ExecutionPhase::Exhausted, &seq, None, None, &err.message);
        self.finish_unfilled(seq, err).await
    }

    /// Classify the spread, honour any post-open wait and return the quote
    /// to price attempt 0 from.
    async fn assess_timing(&self, seq: &Sequence, quote: Quote, deadline: Instant) -> Quote {
        let class = self.classifier.classify(quote.bid, quote.ask);
        let recommendation = self.classifier.recommend(class);
        let advice = self.timing.advise(self.clock.now(), class);

        tracing::info!(
            symbol = %seq.symbol,
            bid = %quote.bid,
            ask = %quote.ask,
            spread_class = ?class,
            urgency = ?recommendation.urgency,
            wait_ms = advice.wait.as_millis() as u64,
            max_slippage_bps = advice.max_slippage_bps,
            in_open_window = advice.in_open_window,
            "Assessed execution timing"
        );

        if !self.config.enable_timing_wait || advice.execute_now() {
            return quote;
        }

        let wait = advice
            .wait
            .min(deadline.saturating_duration_since(Instant::now()));
        log_transition(
            ExecutionPhase::AssessingTiming,
            seq,
            None,
            None,
            "waiting for opening spread to settle",
        );
        tokio::time::sleep(wait).await;

        self.valid_quote(&seq.symbol).await.unwrap_or(quote)
    }

    /// Market order for the remainder after the limit sequence stopped.
    async fn market_fallback(&self, mut seq: Sequence, cause: ExecutionError) -> ExecutionResult {
        let quantity = seq.remaining();
        seq.used_market_fallback = true;
        log_transition(ExecutionPhase::MarketFallback, &seq, None, None, &cause.to_string());
        crate::observability::record_market_fallback(cause.kind.as_str());

        let order = match self
            .gateway
            .submit_market_order(&seq.symbol, seq.side, OrderSize::Shares(quantity))
            .await
        {
            Ok(order) => {
                crate::observability::record_order_submission("market", true);
                order
            }
            Err(e) => {
                crate::observability::record_order_submission("market", false);
                let err = ExecutionError::from(e);
                log_transition(ExecutionPhase::Failed, &seq, None, None, &err.message);
                return seq.into_result(self.clock.now(), Some(&err));
            }
        };
        seq.record_submission(order.id.clone());

        let timeout = self.config.market_fallback_timeout;
        let outcome = match self.await_order(&order.id, timeout).await {
            Some(outcome) => Some(outcome),
            None => self.cancel_and_confirm(&order.id).await,
        };
        if let Some(outcome) = &outcome {
            seq.record_outcome(outcome, None);
        }

        if seq.is_complete() || outcome.is_some_and(|o| o.status == OrderStatus::Filled) {
            log_transition(ExecutionPhase::Filled, &seq, None, None, "market order filled");
            return seq.into_result(self.clock.now(), None);
        }

        let err = match outcome {
            Some(outcome) => ExecutionError::new(
                ErrorKind::GatewayRejection,
                format!("market order {} ended {}", order.id, outcome.status),
            ),
            None => ExecutionError::timeout(format!(
                "market order {} did not settle within {}s",
                order.id,
                timeout.as_secs()
            )),
        };
        log_transition(ExecutionPhase::Failed, &seq, None, None, &err.message);
        seq.into_result(self.clock.now(), Some(&err))
    }

    /// End a sequence that still has quantity open: market fallback when the
    /// error allows it and it is enabled, failure otherwise.
    async fn finish_unfilled(&self, seq: Sequence, err: ExecutionError) -> ExecutionResult {
        if self.config.enable_market_fallback
            && err.allows_market_fallback()
            && seq.remaining() > Decimal::ZERO
        {
            return self.market_fallback(seq, err).await;
        }
        log_transition(ExecutionPhase::Failed, &seq, None, None, &err.message);
        seq.into_result(self.clock.now(), Some(&err))
    }

    /// Cancel an open order and wait for it to reach a terminal status.
    ///
    /// An order that fills while the cancel is in flight reports the fill.
    async fn cancel_and_confirm(&self, order_id: &OrderId) -> Option<CompletionOutcome> {
        if let Err(e) = self.gateway.cancel_order(order_id).await {
            tracing::warn!(order_id = %order_id, error = %e, "Cancel request failed, checking order state");
        }
        let outcome = self
            .await_order(order_id, self.config.cancel_confirm_timeout)
            .await;
        if outcome.is_none() {
            tracing::error!(order_id = %order_id, "Order still open after cancel");
        }
        outcome
    }

    async fn await_order(
        &self,
        order_id: &OrderId,
        wait: std::time::Duration,
    ) -> Option<CompletionOutcome> {
        self.monitor
            .await_completion(std::slice::from_ref(order_id), wait)
            .await
            .remove(order_id)
            .and_then(|status| status.outcome().copied())
    }

    async fn valid_quote(&self, symbol: &Symbol) -> Option<Quote> {
        match self.quotes.get_latest_quote(symbol).await {
            Ok(quote) if quote.is_valid() => Some(quote),
            Ok(quote) => {
                tracing::debug!(
                    symbol = %symbol,
                    bid = %quote.bid,
                    ask = %quote.ask,
                    "Ignoring invalid quote"
                );
                None
            }
            Err(e) => {
                tracing::debug!(symbol = %symbol, error = %e, "Quote unavailable");
                None
            }
        }
    }
}
