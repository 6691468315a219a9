//! Quote Source Port (Driven Port)
//!
//! Interface for the latest top-of-book quote and last trade price.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Top-of-book quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Best bid price.
    pub bid: Decimal,
    /// Best ask price.
    pub ask: Decimal,
    /// Bid size.
    pub bid_size: Decimal,
    /// Ask size.
    pub ask_size: Decimal,
    /// Provider timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Quote stamped with the current time and no size information.
    #[must_use]
    pub fn new(symbol: Symbol, bid: Decimal, ask: Decimal) -> Self {
        Self {
            symbol,
            bid,
            ask,
            bid_size: Decimal::ZERO,
            ask_size: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    /// Both sides positive and the book neither locked nor crossed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > self.bid
    }

    /// Midpoint of bid and ask.
    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Ask minus bid.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// Why a quote or trade price could not be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceFeedError {
    /// The data provider could not be reached or answered with an error.
    #[error("quote provider unavailable: {0}")]
    Transport(String),

    /// The provider does not know the symbol.
    #[error("unknown symbol {symbol}")]
    UnknownSymbol {
        /// Requested symbol.
        symbol: String,
    },

    /// The symbol is known but has no usable price.
    #[error("no price data for {symbol}")]
    NoData {
        /// Requested symbol.
        symbol: String,
    },
}

/// Port for market data lookups.
#[async_trait]
pub trait QuoteSourcePort: Send + Sync {
    /// Get the latest quote for a symbol.
    async fn get_latest_quote(&self, symbol: &Symbol) -> Result<Quote, PriceFeedError>;

    /// Get the price of the most recent trade.
    async fn get_last_trade_price(&self, symbol: &Symbol) -> Result<Decimal, PriceFeedError>;
}
