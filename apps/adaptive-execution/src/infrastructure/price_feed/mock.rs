//! Scriptable quote source for tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{PriceFeedError, Quote, QuoteSourcePort};
use crate::domain::shared::Symbol;

#[derive(Debug, Default)]
struct MockState {
    quotes: HashMap<Symbol, Quote>,
    scripted: HashMap<Symbol, VecDeque<Quote>>,
    last_trades: HashMap<Symbol, Decimal>,
    quote_requests: usize,
}

/// Quote source returning whatever the test configured.
///
/// Scripted quotes are served first, one per request; after that the
/// standing quote set with [`set_quote`](Self::set_quote) is repeated.
#[derive(Debug, Default)]
pub struct MockQuoteSource {
    state: Mutex<MockState>,
}

impl MockQuoteSource {
    /// Create an empty quote source; every lookup fails until configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the standing quote for `quote.symbol`.
    pub fn set_quote(&self, quote: Quote) {
        self.state.lock().quotes.insert(quote.symbol.clone(), quote);
    }

    /// Queue quotes served one per request before the standing quote.
    pub fn script_quotes(&self, symbol: &Symbol, quotes: impl IntoIterator<Item = Quote>) {
        self.state
            .lock()
            .scripted
            .entry(symbol.clone())
            .or_default()
            .extend(quotes);
    }

    /// Forget the standing quote for `symbol`.
    pub fn clear_quote(&self, symbol: &Symbol) {
        let mut state = self.state.lock();
        state.quotes.remove(symbol);
        state.scripted.remove(symbol);
    }

    /// Set the last trade price for `symbol`.
    pub fn set_last_trade(&self, symbol: &Symbol, price: Decimal) {
        self.state.lock().last_trades.insert(symbol.clone(), price);
    }

    /// Quote lookups served so far.
    #[must_use]
    pub fn quote_requests(&self) -> usize {
        self.state.lock().quote_requests
    }
}

#[async_trait]
impl QuoteSourcePort for MockQuoteSource {
    async fn get_latest_quote(&self, symbol: &Symbol) -> Result<Quote, PriceFeedError> {
        let mut state = self.state.lock();
        state.quote_requests += 1;

        if let Some(quote) = state.scripted.get_mut(symbol).and_then(VecDeque::pop_front) {
            return Ok(quote);
        }
        state
            .quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| PriceFeedError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    async fn get_last_trade_price(&self, symbol: &Symbol) -> Result<Decimal, PriceFeedError> {
        self.state
            .lock()
            .last_trades
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceFeedError::NoData {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn scripted_quotes_precede_standing_quote() {
        let source = MockQuoteSource::new();
        let symbol = Symbol::new("AAPL");
        source.set_quote(Quote::new(symbol.clone(), dec!(10.00), dec!(10.02)));
        source.script_quotes(
            &symbol,
            [Quote::new(symbol.clone(), dec!(9.00), dec!(9.50))],
        );

        assert_eq!(source.get_latest_quote(&symbol).await.unwrap().bid, dec!(9.00));
        assert_eq!(source.get_latest_quote(&symbol).await.unwrap().bid, dec!(10.00));
        assert_eq!(source.get_latest_quote(&symbol).await.unwrap().bid, dec!(10.00));
        assert_eq!(source.quote_requests(), 3);
    }

    #[tokio::test]
    async fn unknown_symbol_fails() {
        let source = MockQuoteSource::new();
        let symbol = Symbol::new("MSFT");

        assert!(matches!(
            source.get_latest_quote(&symbol).await,
            Err(PriceFeedError::UnknownSymbol { .. })
        ));
        assert!(matches!(
            source.get_last_trade_price(&symbol).await,
            Err(PriceFeedError::NoData { .. })
        ));

        source.set_last_trade(&symbol, dec!(410.5));
        assert_eq!(source.get_last_trade_price(&symbol).await.unwrap(), dec!(410.5));
    }
}
