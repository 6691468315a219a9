//! Spread quality classification types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality of a bid/ask spread, narrowest first.
///
/// Ordering follows width, so `max` of two assessments is the more
/// conservative one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadClass {
    /// Near-zero spread; execute immediately and aggressively.
    Urgent,
    /// Narrow spread.
    Tight,
    /// Ordinary spread.
    Normal,
    /// Wide spread; be patient.
    Wide,
}

impl fmt::Display for SpreadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Urgent => write!(f, "urgent"),
            Self::Tight => write!(f, "tight"),
            Self::Normal => write!(f, "normal"),
            Self::Wide => write!(f, "wide"),
        }
    }
}

/// How aggressively to work an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionUrgency {
    /// Work patiently.
    Low,
    /// Default pace.
    Normal,
    /// Work quickly.
    High,
    /// Take liquidity now.
    Urgent,
}

/// What the classifier suggests doing with a given spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadRecommendation {
    /// Spread class the recommendation was derived from.
    pub class: SpreadClass,
    /// Suggested urgency.
    pub urgency: ExecutionUrgency,
    /// Fraction of the spread to cross, 0 (passive) to 1 (far side).
    pub inside_spread_factor: f64,
    /// Scale applied to attempt timeouts.
    pub timeout_multiplier: f64,
}

/// Thresholds used by the spread classifier.
///
/// Absolute thresholds are in cents, relative ones in basis points of the
/// midpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadThresholds {
    /// Spreads at or below this many cents may be urgent.
    #[serde(default = "default_urgent_cents")]
    pub urgent_max_cents: Decimal,
    /// Spreads at or below this many cents are tight.
    #[serde(default = "default_tight_cents")]
    pub tight_max_cents: Decimal,
    /// Spreads at or below this many cents are normal.
    #[serde(default = "default_normal_cents")]
    pub normal_max_cents: Decimal,
    /// Spreads at or below this many basis points are tight.
    #[serde(default = "default_tight_bps")]
    pub tight_max_bps: Decimal,
    /// Spreads at or below this many basis points are normal.
    #[serde(default = "default_normal_bps")]
    pub normal_max_bps: Decimal,
}

fn default_urgent_cents() -> Decimal {
    Decimal::ONE
}

fn default_tight_cents() -> Decimal {
    Decimal::from(3)
}

fn default_normal_cents() -> Decimal {
    Decimal::from(5)
}

fn default_tight_bps() -> Decimal {
    Decimal::from(10)
}

fn default_normal_bps() -> Decimal {
    Decimal::from(50)
}

impl Default for SpreadThresholds {
    fn default() -> Self {
        Self {
            urgent_max_cents: default_urgent_cents(),
            tight_max_cents: default_tight_cents(),
            normal_max_cents: default_normal_cents(),
            tight_max_bps: default_tight_bps(),
            normal_max_bps: default_normal_bps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_order_by_width() {
        assert!(SpreadClass::Urgent < SpreadClass::Tight);
        assert!(SpreadClass::Tight < SpreadClass::Normal);
        assert!(SpreadClass::Normal < SpreadClass::Wide);
        assert_eq!(SpreadClass::Tight.max(SpreadClass::Wide), SpreadClass::Wide);
    }

    #[test]
    fn thresholds_default_from_empty_document() {
        let parsed: SpreadThresholds = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, SpreadThresholds::default());
        assert_eq!(parsed.tight_max_cents, Decimal::from(3));
    }
}
