use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle status of an order. Values map 1:1 to the `status` column on
/// the `orders` table; transitions between them are governed by
/// [`super::graph`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    /// Initial contact, nothing committed yet. The only state an order may
    /// be hard-deleted from.
    Inquiry,
    /// Quotation sent to the customer.
    Quotation,
    /// Work confirmed by the customer.
    Confirmed,
    /// Site measurement done.
    Measurement,
    /// Installation date agreed with the customer.
    DateFixed,
    /// Materials reserved against stock.
    MaterialHeld,
    /// Installation finished, held materials consumed.
    Installed,
    /// Waiting for the customer to settle.
    SettlementWait,
    /// Payment received and booked.
    RevenueConfirmed,
    /// Terminal cancellation; held stock released, dependents cancelled.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Inquiry => "inquiry",
            OrderStatus::Quotation => "quotation",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Measurement => "measurement",
            OrderStatus::DateFixed => "date_fixed",
            OrderStatus::MaterialHeld => "material_held",
            OrderStatus::Installed => "installed",
            OrderStatus::SettlementWait => "settlement_wait",
            OrderStatus::RevenueConfirmed => "revenue_confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::RevenueConfirmed | OrderStatus::Cancelled)
    }

    /// Position along the happy path, used to answer "has this order reached
    /// or passed status X". `Cancelled` sits outside the path.
    pub fn phase(&self) -> Option<u8> {
        match self {
            OrderStatus::Inquiry => Some(0),
            OrderStatus::Quotation => Some(1),
            OrderStatus::Confirmed => Some(2),
            OrderStatus::Measurement => Some(3),
            OrderStatus::DateFixed => Some(4),
            OrderStatus::MaterialHeld => Some(5),
            OrderStatus::Installed => Some(6),
            OrderStatus::SettlementWait => Some(7),
            OrderStatus::RevenueConfirmed => Some(8),
            OrderStatus::Cancelled => None,
        }
    }

    /// True once the order has reached `other` on the happy path.
    pub fn has_reached(&self, other: OrderStatus) -> bool {
        match (self.phase(), other.phase()) {
            (Some(mine), Some(theirs)) => mine >= theirs,
            _ => false,
        }
    }
}

/// Status of an outsourced fabrication order. Independent of the order
/// lifecycle: it feeds advisory readiness checks only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutsourceStatus {
    Requested,
    InProgress,
    Completed,
    Cancelled,
}

impl OutsourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutsourceStatus::Requested => "requested",
            OutsourceStatus::InProgress => "in_progress",
            OutsourceStatus::Completed => "completed",
            OutsourceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OutsourceStatus::Completed | OutsourceStatus::Cancelled)
    }

    /// `requested -> in_progress -> completed`, with `cancelled` reachable
    /// from the two non-terminal states only.
    pub fn can_transition(&self, to: OutsourceStatus) -> bool {
        use OutsourceStatus::*;
        matches!(
            (self, to),
            (Requested, InProgress)
                | (Requested, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn status_round_trips_through_strings() {
        for status in OrderStatus::iter() {
            assert_eq!(OrderStatus::from_str(status.as_str()).unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn cancelled_has_no_phase() {
        assert_eq!(OrderStatus::Cancelled.phase(), None);
        assert!(!OrderStatus::Cancelled.has_reached(OrderStatus::Inquiry));
        assert!(!OrderStatus::Installed.has_reached(OrderStatus::Cancelled));
    }

    #[test]
    fn installed_has_reached_confirmed() {
        assert!(OrderStatus::Installed.has_reached(OrderStatus::Confirmed));
        assert!(!OrderStatus::Quotation.has_reached(OrderStatus::Confirmed));
    }

    #[test]
    fn outsource_machine_blocks_exits_from_terminal_states() {
        for terminal in [OutsourceStatus::Completed, OutsourceStatus::Cancelled] {
            for target in OutsourceStatus::iter() {
                assert!(!terminal.can_transition(target));
            }
        }
        assert!(OutsourceStatus::Requested.can_transition(OutsourceStatus::InProgress));
        assert!(OutsourceStatus::InProgress.can_transition(OutsourceStatus::Cancelled));
        assert!(!OutsourceStatus::Requested.can_transition(OutsourceStatus::Completed));
    }
}
