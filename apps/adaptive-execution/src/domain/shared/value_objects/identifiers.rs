//! Strongly-typed identifiers.
//!
//! Broker order ids, the client ids we send with submissions and the
//! (correlation, plan hash) pair that de-duplicates executions are all plain
//! strings on the wire; separate types keep them from being swapped.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is blank.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id! {
    /// Broker-assigned identifier for a submitted order.
    OrderId
}

define_id! {
    /// Identifier we attach to each submission so the broker can reject
    /// accidental duplicates.
    ClientOrderId
}

define_id! {
    /// Ties an execution back to the rebalance run that requested it.
    CorrelationId
}

define_id! {
    /// Content hash of an execution plan. Paired with a [`CorrelationId`] it
    /// identifies one execution attempt.
    PlanHash
}

impl ClientOrderId {
    /// Fresh random id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_client_ids_are_unique() {
        let first = ClientOrderId::generate();
        assert!(!first.is_empty());
        assert_ne!(first, ClientOrderId::generate());
    }

    #[test]
    fn conversions_preserve_value() {
        let correlation: CorrelationId = "run-7".into();
        let hash = PlanHash::from(String::from("abc123"));
        assert_eq!(correlation.to_string(), "run-7");
        assert_eq!(hash.as_str(), "abc123");
        assert!(OrderId::new("  ").is_empty());
    }

    #[test]
    fn serde_is_transparent() {
        let id: OrderId = serde_json::from_str("\"ord-1\"").unwrap();
        assert_eq!(id, OrderId::new("ord-1"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ord-1\"");
    }
}
