//! Spread Classifier Domain Service
//!
//! Scores a bid/ask pair against both absolute (cents) and relative
//! (basis points of the midpoint) thresholds. The final class is the wider
//! of the two assessments; a spread counts as urgent only when it is under
//! the absolute urgent floor and tight in relative terms.

use rust_decimal::Decimal;

use crate::domain::execution_tactics::value_objects::{
    ExecutionUrgency, SpreadClass, SpreadRecommendation, SpreadThresholds,
};

/// Classifies spreads against configurable thresholds.
#[derive(Debug, Clone, Default)]
pub struct SpreadClassifier {
    thresholds: SpreadThresholds,
}

impl SpreadClassifier {
    /// Create a classifier.
    #[must_use]
    pub const fn new(thresholds: SpreadThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify a quote. Crossed, locked or non-positive quotes are `Wide`.
    #[must_use]
    pub fn classify(&self, bid: Decimal, ask: Decimal) -> SpreadClass {
        if bid <= Decimal::ZERO || ask <= bid {
            return SpreadClass::Wide;
        }

        let spread = ask - bid;
        let cents = spread * Decimal::ONE_HUNDRED;
        let midpoint = (bid + ask) / Decimal::TWO;
        let bps = spread / midpoint * Decimal::from(10_000);

        let absolute = self.classify_cents(cents);
        let relative = self.classify_bps(bps);

        if absolute == SpreadClass::Urgent && relative == SpreadClass::Tight {
            SpreadClass::Urgent
        } else {
            absolute.max(relative)
        }
    }

    /// Execution recommendation for a spread class.
    #[must_use]
    pub const fn recommend(&self, class: SpreadClass) -> SpreadRecommendation {
        let (urgency, inside_spread_factor, timeout_multiplier) = match class {
            SpreadClass::Urgent => (ExecutionUrgency::Urgent, 1.0, 0.5),
            SpreadClass::Tight => (ExecutionUrgency::High, 0.75, 0.75),
            SpreadClass::Normal => (ExecutionUrgency::Normal, 0.5, 1.0),
            SpreadClass::Wide => (ExecutionUrgency::Low, 0.25, 1.5),
        };
        SpreadRecommendation {
            class,
            urgency,
            inside_spread_factor,
            timeout_multiplier,
        }
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &SpreadThresholds {
        &self.thresholds
    }

    fn classify_cents(&self, cents: Decimal) -> SpreadClass {
        if cents <= self.thresholds.urgent_max_cents {
            SpreadClass::Urgent
        } else if cents <= self.thresholds.tight_max_cents {
            SpreadClass::Tight
        } else if cents <= self.thresholds.normal_max_cents {
            SpreadClass::Normal
        } else {
            SpreadClass::Wide
        }
    }

    fn classify_bps(&self, bps: Decimal) -> SpreadClass {
        if bps <= self.thresholds.tight_max_bps {
            SpreadClass::Tight
        } else if bps <= self.thresholds.normal_max_bps {
            SpreadClass::Normal
        } else {
            SpreadClass::Wide
        }
    }
}
