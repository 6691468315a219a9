//! Tradability facts about an instrument.

use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Broker metadata relevant to sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Instrument.
    pub symbol: Symbol,
    /// Whether new purchases may use non-integer quantities.
    pub fractionable: bool,
    /// Whether the broker accepts orders for the instrument at all.
    pub tradable: bool,
}

impl AssetInfo {
    /// Tradable asset with the given fractionability.
    #[must_use]
    pub const fn new(symbol: Symbol, fractionable: bool) -> Self {
        Self {
            symbol,
            fractionable,
            tradable: true,
        }
    }
}
