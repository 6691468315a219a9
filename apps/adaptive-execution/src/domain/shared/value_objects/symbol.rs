//! Ticker symbols.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Longest symbol the broker accepts (option symbols are the long tail).
const MAX_SYMBOL_LEN: usize = 21;

/// An uppercase ticker such as `AAPL`, `BRK.B` or the crypto pair `BTC/USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim and uppercase `value`. Call [`Symbol::validate`] before trading it.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// The normalized ticker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Crypto pairs are written `BASE/QUOTE`.
    #[must_use]
    pub fn is_crypto(&self) -> bool {
        self.0.contains('/')
    }

    /// Form used inside REST paths, where the pair slash is dropped.
    #[must_use]
    pub fn path_segment(&self) -> String {
        self.0.replace('/', "")
    }

    /// Check the symbol can be submitted.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidValue`] for an empty or over-long symbol,
    /// or one containing characters other than alphanumerics, `.`, `/`, `-`.
    pub fn validate(&self) -> Result<(), DomainError> {
        let problem = if self.0.is_empty() {
            "must not be empty"
        } else if self.0.len() > MAX_SYMBOL_LEN {
            "is too long"
        } else if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '-'))
        {
            "contains invalid characters"
        } else {
            return Ok(());
        };
        Err(DomainError::invalid_value("symbol", format!("'{}' {problem}", self.0)))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}
