//! Execute Trade Use Case
//!
//! Drives one trade intent to completion with an adaptive sequence of
//! marketable limit orders, falling back to a market order when the limit
//! sequence cannot finish. See [`ExecutionPhase`] for the states a sequence
//! moves through.

mod batch;
mod sequence;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::application::dto::{ExecutionRequest, IdempotentExecution};
use crate::application::ports::{ClockPort, OrderGatewayPort, QuoteSourcePort, SystemClock};
use crate::application::services::{
    CompletionMonitor, ExecutionIdempotencyStore, ShareQuantityResolver,
};
use crate::domain::execution_tactics::{
    MarketTimingAdvisor, MarketTimingConfig, SpreadClassifier, SpreadThresholds, StrategyConfig,
};
use crate::domain::order_execution::{ExecutionError, ExecutionResult, OrderSize};
use crate::domain::position_sizing::{SafeguardConfig, TradeItem};
use crate::domain::shared::{CorrelationId, OrderId, PlanHash, Symbol};

pub use sequence::ExecutionPhase;

use sequence::Sequence;

/// Use case for executing trade intents.
pub struct ExecuteTradeUseCase<G, Q>
where
    G: OrderGatewayPort,
    Q: QuoteSourcePort,
{
    gateway: Arc<G>,
    quotes: Arc<Q>,
    monitor: Arc<CompletionMonitor<G>>,
    config: Arc<StrategyConfig>,
    classifier: SpreadClassifier,
    timing: MarketTimingAdvisor,
    resolver: ShareQuantityResolver<G, Q>,
    clock: Arc<dyn ClockPort>,
    idempotency: Option<Arc<ExecutionIdempotencyStore>>,
}

impl<G, Q> ExecuteTradeUseCase<G, Q>
where
    G: OrderGatewayPort,
    Q: QuoteSourcePort,
{
    /// Create a new `ExecuteTradeUseCase` with default spread, timing and
    /// sizing settings.
    pub fn new(
        gateway: Arc<G>,
        quotes: Arc<Q>,
        monitor: Arc<CompletionMonitor<G>>,
        config: Arc<StrategyConfig>,
    ) -> Self {
        let resolver = ShareQuantityResolver::new(
            Arc::clone(&gateway),
            Arc::clone(&quotes),
            SafeguardConfig::default(),
        );
        Self {
            gateway,
            quotes,
            monitor,
            config,
            classifier: SpreadClassifier::new(SpreadThresholds::default()),
            timing: MarketTimingAdvisor::new(MarketTimingConfig::default()),
            resolver,
            clock: Arc::new(SystemClock),
            idempotency: None,
        }
    }

    /// Use custom spread thresholds.
    #[must_use]
    pub fn with_spread_thresholds(mut self, thresholds: SpreadThresholds) -> Self {
        self.classifier = SpreadClassifier::new(thresholds);
        self
    }

    /// Use a custom post-open timing window.
    #[must_use]
    pub fn with_timing_config(mut self, config: MarketTimingConfig) -> Self {
        self.timing = MarketTimingAdvisor::new(config);
        self
    }

    /// Use custom quantity safeguard settings.
    #[must_use]
    pub fn with_safeguard_config(mut self, config: SafeguardConfig) -> Self {
        self.resolver =
            ShareQuantityResolver::new(Arc::clone(&self.gateway), Arc::clone(&self.quotes), config);
        self
    }

    /// Use a custom wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn ClockPort>) -> Self {
        self.clock = clock;
        self
    }

    /// Enable idempotent execution.
    #[must_use]
    pub fn with_idempotency_store(mut self, store: Arc<ExecutionIdempotencyStore>) -> Self {
        self.idempotency = Some(store);
        self
    }

    /// Strategy configuration in use.
    #[must_use]
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Execute one trade request.
    ///
    /// Never fails: every error is reported through the returned result.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let submitted_at = self.clock.now();
        let ExecutionRequest { symbol, side, size } = request;

        if let Err(err) = self.validate(&symbol, size) {
            tracing::warn!(symbol = %symbol, side = %side, error = %err, "Execution request rejected");
            crate::observability::record_execution_outcome(false, false, Some(err.kind.as_str()));
            return ExecutionResult::rejected(symbol, side, size.amount(), submitted_at, &err);
        }

        let quantity = match size {
            OrderSize::Shares(quantity) => quantity,
            OrderSize::Notional(amount) => {
                let item = TradeItem::new(symbol.clone(), side, amount, Decimal::ONE);
                self.resolver.resolve_shares(&item).await.quantity
            }
        };

        if quantity <= Decimal::ZERO {
            let err = ExecutionError::input(format!("resolved quantity for {symbol} is zero"));
            tracing::warn!(symbol = %symbol, side = %side, amount = %size.amount(), "Nothing to execute");
            crate::observability::record_execution_outcome(false, false, Some(err.kind.as_str()));
            return ExecutionResult::rejected(symbol, side, quantity, submitted_at, &err);
        }

        let result = self
            .run_sequence(Sequence::new(symbol, side, quantity, submitted_at))
            .await;

        crate::observability::record_execution_outcome(
            result.success,
            result.used_market_fallback,
            result.error_kind.map(|kind| kind.as_str()),
        );
        result
    }

    /// Size a trade intent with the quantity safeguard, then execute it.
    pub async fn execute_trade_item(&self, item: &TradeItem) -> ExecutionResult {
        let resolution = self.resolver.resolve_shares(item).await;

        if resolution.quantity <= Decimal::ZERO {
            let err = ExecutionError::input(format!(
                "resolved quantity for {} is zero",
                item.symbol
            ));
            tracing::info!(
                symbol = %item.symbol,
                side = %item.action,
                trade_amount = %item.trade_amount,
                "Trade intent resolves to zero shares, skipping"
            );
            return ExecutionResult::rejected(
                item.symbol.clone(),
                item.action,
                Decimal::ZERO,
                self.clock.now(),
                &err,
            );
        }

        self.execute(ExecutionRequest::shares(
            item.symbol.clone(),
            item.action,
            resolution.quantity,
        ))
        .await
    }

    /// Execute unless `(correlation_id, plan_hash)` has already been recorded
    /// or is executing right now.
    ///
    /// Without an idempotency store this is plain [`Self::execute`].
    pub async fn execute_idempotent(
        &self,
        correlation_id: &CorrelationId,
        plan_hash: &PlanHash,
        request: ExecutionRequest,
    ) -> IdempotentExecution {
        let Some(store) = &self.idempotency else {
            return IdempotentExecution::Executed(self.execute(request).await);
        };

        // Held until the attempt is recorded
        let Some(_claim) = store.claim(correlation_id, plan_hash) else {
            return skipped(correlation_id, plan_hash, &request.symbol, "Execution already in flight, skipping");
        };
        if store.has_been_executed(correlation_id, plan_hash).await {
            return skipped(correlation_id, plan_hash, &request.symbol, "Execution already recorded, skipping");
        }

        let result = self.execute(request).await;
        store
            .record_attempt(correlation_id, plan_hash, result.success, attempt_metadata(&result))
            .await;
        IdempotentExecution::Executed(result)
    }

    /// Returns true iff every order settles within `max_wait`.
    pub async fn await_settlement(&self, order_ids: &[OrderId], max_wait: Duration) -> bool {
        self.monitor.await_settlement(order_ids, max_wait).await
    }

    fn validate(&self, symbol: &Symbol, size: OrderSize) -> Result<(), ExecutionError> {
        symbol.validate()?;
        if !size.is_positive() {
            return Err(ExecutionError::input("order size must be positive"));
        }
        self.config
            .validate()
            .map_err(|e| ExecutionError::input(e.to_string()))
    }
}

fn skipped(
    correlation_id: &CorrelationId,
    plan_hash: &PlanHash,
    symbol: &Symbol,
    reason: &'static str,
) -> IdempotentExecution {
    tracing::info!(
        correlation_id = %correlation_id,
        plan_hash = %plan_hash,
        symbol = %symbol,
        "{reason}"
    );
    crate::observability::record_idempotent_skip();
    IdempotentExecution::Skipped {
        correlation_id: correlation_id.clone(),
        plan_hash: plan_hash.clone(),
    }
}

fn attempt_metadata(result: &ExecutionResult) -> HashMap<String, String> {
    let mut metadata = HashMap::from([
        ("symbol".to_string(), result.symbol.to_string()),
        ("side".to_string(), result.side.as_str().to_string()),
        ("requested_quantity".to_string(), result.requested_quantity.to_string()),
        ("filled_quantity".to_string(), result.filled_quantity.to_string()),
        ("attempts".to_string(), result.attempts.to_string()),
    ]);
    if let Some(order_id) = &result.order_id {
        metadata.insert("order_id".to_string(), order_id.to_string());
    }
    if let Some(error) = &result.error {
        metadata.insert("error".to_string(), error.clone());
    }
    metadata
}
