//! Quote Source Adapters
//!
//! Implementations of `QuoteSourcePort`.

mod alpaca;
mod mock;

pub use alpaca::AlpacaQuoteSource;
pub use mock::MockQuoteSource;
