//! Broker-reported order status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Latest status the broker reported for an order.
///
/// `Filled`, `Canceled`, `Rejected` and `Expired` are terminal: once an order
/// reaches one of them its filled quantity is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received, not yet routed.
    New,
    /// Routed, awaiting acknowledgment.
    PendingNew,
    /// Working on the book.
    Accepted,
    /// Some shares filled, the rest still working.
    PartiallyFilled,
    /// Every share filled.
    Filled,
    /// Cancel requested, not yet confirmed.
    PendingCancel,
    /// Canceled, possibly after a partial fill.
    Canceled,
    /// Refused by the broker.
    Rejected,
    /// Ran out of time in force.
    Expired,
}

impl OrderStatus {
    /// Returns true if the status can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }

    /// Snake-case name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::PendingNew => "pending_new",
            Self::Accepted => "accepted",
            Self::PartiallyFilled => "partially_filled",
            Self::Filled => "filled",
            Self::PendingCancel => "pending_cancel",
            Self::Canceled => "canceled",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OrderStatus::New, false)]
    #[test_case(OrderStatus::PendingNew, false)]
    #[test_case(OrderStatus::Accepted, false)]
    #[test_case(OrderStatus::PartiallyFilled, false)]
    #[test_case(OrderStatus::PendingCancel, false)]
    #[test_case(OrderStatus::Filled, true)]
    #[test_case(OrderStatus::Canceled, true)]
    #[test_case(OrderStatus::Rejected, true)]
    #[test_case(OrderStatus::Expired, true)]
    fn terminal_statuses(status: OrderStatus, terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn display_matches_serde() {
        let status = OrderStatus::PartiallyFilled;
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            format!("\"{status}\"")
        );
    }
}
