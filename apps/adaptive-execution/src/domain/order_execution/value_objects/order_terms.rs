//! Order vocabulary shared with the broker: side, type and time in force.
//!
//! Each enum round-trips through the broker's lowercase wire form via
//! `as_str` / `FromStr` and serializes the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Lowercase wire form used by the broker API.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $( $wire => Ok(Self::$variant), )+
                    other => Err(DomainError::invalid_value(
                        $field,
                        format!("unknown value '{other}'"),
                    )),
                }
            }
        }
    };
}

wire_enum! {
    /// Direction of a trade.
    OrderSide as "side" {
        /// Buy.
        Buy => "buy",
        /// Sell.
        Sell => "sell",
    }
}

wire_enum! {
    /// Order types the engine submits.
    OrderType as "order_type" {
        /// Fill at the prevailing price.
        Market => "market",
        /// Fill at the limit price or better.
        Limit => "limit",
    }
}

wire_enum! {
    /// How long an order rests before the broker expires it.
    #[derive(Default)]
    TimeInForce as "time_in_force" {
        /// Current session only.
        #[default]
        Day => "day",
        /// Good til canceled.
        Gtc => "gtc",
        /// Immediate or cancel.
        Ioc => "ioc",
        /// Fill or kill.
        Fok => "fok",
    }
}

impl OrderType {
    /// Limit orders carry a price; market orders must not.
    #[must_use]
    pub const fn requires_limit_price(&self) -> bool {
        matches!(self, Self::Limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("buy", OrderSide::Buy)]
    #[test_case("SELL", OrderSide::Sell)]
    fn side_parses_any_case(raw: &str, expected: OrderSide) {
        assert_eq!(raw.parse::<OrderSide>().unwrap(), expected);
    }

    #[test]
    fn unknown_side_is_rejected() {
        let err = "short".parse::<OrderSide>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidValue { field: "side", .. }));
    }

    #[test]
    fn serde_uses_wire_form() {
        assert_eq!(serde_json::to_string(&OrderSide::Buy).unwrap(), "\"buy\"");
        let tif: TimeInForce = serde_json::from_str("\"gtc\"").unwrap();
        assert_eq!(tif, TimeInForce::Gtc);
        assert_eq!(OrderType::Limit.to_string(), "limit");
    }

    #[test]
    fn only_limit_requires_price() {
        assert!(OrderType::Limit.requires_limit_price());
        assert!(!OrderType::Market.requires_limit_price());
        assert_eq!(TimeInForce::default(), TimeInForce::Day);
    }
}
