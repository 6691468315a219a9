//! Sell-then-buy batch execution.

use futures::future::join_all;

use super::ExecuteTradeUseCase;
use crate::application::dto::BatchExecutionReport;
use crate::application::ports::{OrderGatewayPort, QuoteSourcePort};
use crate::domain::order_execution::OrderSide;
use crate::domain::position_sizing::TradeItem;
use crate::domain::shared::OrderId;

impl<G, Q> ExecuteTradeUseCase<G, Q>
where
    G: OrderGatewayPort,
    Q: QuoteSourcePort,
{
    /// Execute a batch of trade intents.
    ///
    /// Sells run concurrently first and must settle before the buys start,
    /// so the proceeds are available as buying power. Buys then run
    /// concurrently. Buys still run when some sells failed or did not settle.
    pub async fn execute_batch(&self, items: &[TradeItem]) -> BatchExecutionReport {
        let (sells, buys): (Vec<&TradeItem>, Vec<&TradeItem>) =
            items.iter().partition(|item| item.action == OrderSide::Sell);

        tracing::info!(sells = sells.len(), buys = buys.len(), "Executing trade batch");

        let sell_results = join_all(sells.iter().map(|item| self.execute_trade_item(item))).await;

        let sell_orders: Vec<OrderId> = sell_results
            .iter()
            .filter_map(|result| result.order_id.clone())
            .collect();
        let sells_settled = sell_orders.is_empty()
            || self
                .await_settlement(&sell_orders, self.config.settlement_timeout)
                .await;

        if !sells_settled {
            tracing::warn!(
                orders = sell_orders.len(),
                "Sell orders did not all settle, buying power may be short"
            );
        }

        let buy_results = join_all(buys.iter().map(|item| self.execute_trade_item(item))).await;

        let report = BatchExecutionReport {
            sells: sell_results,
            buys: buy_results,
            sells_settled,
        };
        tracing::info!(
            failures = report.failure_count(),
            sells_settled,
            "Trade batch complete"
        );
        report
    }
}
