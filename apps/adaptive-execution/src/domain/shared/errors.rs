//! Domain errors.

use rust_decimal::Decimal;
use thiserror::Error;

/// Violations detected by domain types before anything reaches the broker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A field holds a value the domain cannot act on.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A broker report claims more shares filled than were ordered.
    #[error("filled quantity {filled} exceeds order quantity {quantity}")]
    Overfill {
        /// Reported fill.
        filled: Decimal,
        /// Ordered quantity.
        quantity: Decimal,
    },
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidValue`].
    #[must_use]
    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
