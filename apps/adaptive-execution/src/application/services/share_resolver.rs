//! Share Quantity Resolver
//!
//! Feeds the quantity safeguard with live data: the held position, a
//! reference price (quote midpoint, else last trade) and asset
//! fractionability.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::application::ports::{OrderGatewayPort, QuoteSourcePort};
use crate::domain::order_execution::OrderSide;
use crate::domain::position_sizing::{
    AssetInfo, QuantitySafeguard, SafeguardConfig, ShareResolution, SizingBasis, TradeItem,
};
use crate::domain::shared::Symbol;

/// Resolves trade intents to share quantities.
pub struct ShareQuantityResolver<G, Q>
where
    G: OrderGatewayPort,
    Q: QuoteSourcePort,
{
    gateway: Arc<G>,
    quotes: Arc<Q>,
    safeguard: QuantitySafeguard,
}

impl<G, Q> ShareQuantityResolver<G, Q>
where
    G: OrderGatewayPort,
    Q: QuoteSourcePort,
{
    /// Create a resolver.
    pub const fn new(gateway: Arc<G>, quotes: Arc<Q>, config: SafeguardConfig) -> Self {
        Self {
            gateway,
            quotes,
            safeguard: QuantitySafeguard::with_config(config),
        }
    }

    /// Resolve the share quantity for a trade intent.
    pub async fn resolve_shares(&self, item: &TradeItem) -> ShareResolution {
        let position = match item.action {
            OrderSide::Sell => self.position(&item.symbol).await,
            OrderSide::Buy => Decimal::ZERO,
        };

        if item.is_full_liquidation() {
            let resolution =
                self.safeguard
                    .resolve(item, None, position, &AssetInfo::new(item.symbol.clone(), true));
            tracing::info!(
                symbol = %item.symbol,
                quantity = %resolution.quantity,
                "Full liquidation, selling entire position"
            );
            return resolution;
        }

        let price = self.reference_price(&item.symbol).await;
        let asset = match item.action {
            OrderSide::Buy => self.asset_info(&item.symbol).await,
            OrderSide::Sell => AssetInfo::new(item.symbol.clone(), true),
        };
        let resolution = self.safeguard.resolve(item, price, position, &asset);

        match resolution.basis {
            SizingBasis::MinimumUnit => tracing::warn!(
                symbol = %item.symbol,
                trade_amount = %item.trade_amount,
                quantity = %resolution.quantity,
                "No usable price, buying minimum unit"
            ),
            SizingBasis::FullPosition => tracing::warn!(
                symbol = %item.symbol,
                trade_amount = %item.trade_amount,
                quantity = %resolution.quantity,
                "No usable price, selling full position"
            ),
            SizingBasis::Priced if resolution.capped_at_position => tracing::info!(
                symbol = %item.symbol,
                trade_amount = %item.trade_amount,
                position = %position,
                "Sell capped at held position"
            ),
            SizingBasis::Priced | SizingBasis::Liquidation => tracing::debug!(
                symbol = %item.symbol,
                quantity = %resolution.quantity,
                price = ?resolution.price,
                "Resolved share quantity"
            ),
        }

        resolution
    }

    /// Quote midpoint if the quote is valid, otherwise the last trade price.
    pub async fn reference_price(&self, symbol: &Symbol) -> Option<Decimal> {
        match self.quotes.get_latest_quote(symbol).await {
            Ok(quote) if quote.is_valid() => return Some(quote.mid()),
            Ok(_) => tracing::debug!(symbol = %symbol, "Latest quote invalid, trying last trade"),
            Err(e) => tracing::debug!(symbol = %symbol, error = %e, "Quote unavailable, trying last trade"),
        }

        match self.quotes.get_last_trade_price(symbol).await {
            Ok(price) if price > Decimal::ZERO => Some(price),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(symbol = %symbol, error = %e, "Last trade unavailable");
                None
            }
        }
    }

    async fn position(&self, symbol: &Symbol) -> Decimal {
        match self.gateway.get_position(symbol).await {
            Ok(qty) => qty,
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Position lookup failed, assuming flat");
                Decimal::ZERO
            }
        }
    }

    async fn asset_info(&self, symbol: &Symbol) -> AssetInfo {
        match self.gateway.get_asset_info(symbol).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(
                    symbol = %symbol,
                    error = %e,
                    "Asset lookup failed, assuming whole shares only"
                );
                AssetInfo::new(symbol.clone(), false)
            }
        }
    }
}
