//! Static adjacency for the order status graph.
//!
//! Forward edges are the normal lifecycle progression; backward edges allow
//! corrections one hop at a time. The graph is data, not branching logic:
//! every rule about what may follow what lives in the two tables below.

use super::status::OrderStatus;

use OrderStatus::*;

/// Legal next states, one hop only. `Cancelled` appears as a forward edge
/// from every non-terminal state except the two settlement states.
pub fn forward(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        Inquiry => &[Quotation, Cancelled],
        Quotation => &[Confirmed, Cancelled],
        Confirmed => &[Measurement, Cancelled],
        Measurement => &[DateFixed, Cancelled],
        DateFixed => &[MaterialHeld, Cancelled],
        MaterialHeld => &[Installed, Cancelled],
        Installed => &[SettlementWait, Cancelled],
        SettlementWait => &[RevenueConfirmed],
        RevenueConfirmed => &[],
        Cancelled => &[],
    }
}

/// Legal previous states reachable from here, supporting corrections.
/// Terminal states have none.
pub fn backward(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        Inquiry => &[],
        Quotation => &[Inquiry],
        Confirmed => &[Quotation],
        Measurement => &[Confirmed],
        DateFixed => &[Measurement],
        MaterialHeld => &[DateFixed],
        Installed => &[MaterialHeld],
        SettlementWait => &[Installed],
        RevenueConfirmed => &[],
        Cancelled => &[],
    }
}

/// Forward reachability in exactly one hop. Multi-step transitions require
/// multiple calls; there is no implicit reachability.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    from != to && forward(from).contains(&to)
}

/// Whether the validator will admit the move at all: forward progression or
/// a one-hop backward correction.
pub fn is_legal_move(from: OrderStatus, to: OrderStatus) -> bool {
    from != to && (forward(from).contains(&to) || backward(from).contains(&to))
}
