//! Declarative required-field table for gated transitions.
//!
//! Each `(from, to)` pair maps to the order fields a caller must populate
//! before the transition may commit. The table only describes; checking
//! happens in [`super::validator`].

use serde::{Deserialize, Serialize};
use strum::Display;

use super::status::OrderStatus;

/// Order fields that can gate a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderField {
    QuotationAmount,
    ConfirmedAmount,
    MeasurementDate,
    InstallationDate,
    PaymentMethod,
    SettlementMemo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Decimal amount, satisfied only when present and strictly positive.
    Money,
    /// Calendar date, satisfied when present.
    Date,
    /// Free text, satisfied when present and non-blank.
    Text,
}

/// One row of the requirements table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: OrderField,
    pub kind: FieldKind,
    pub required: bool,
}

const fn rule(field: OrderField, kind: FieldKind, required: bool) -> FieldRule {
    FieldRule {
        field,
        kind,
        required,
    }
}

// The table rows live as `const` slices so `rules_for` can hand out
// `&'static` borrows.
const NO_RULES: &[FieldRule] = &[];

const INQUIRY_TO_QUOTATION: &[FieldRule] =
    &[rule(OrderField::QuotationAmount, FieldKind::Money, true)];

const QUOTATION_TO_CONFIRMED: &[FieldRule] = &[
    rule(OrderField::ConfirmedAmount, FieldKind::Money, true),
    rule(OrderField::InstallationDate, FieldKind::Date, true),
];

const CONFIRMED_TO_MEASUREMENT: &[FieldRule] =
    &[rule(OrderField::MeasurementDate, FieldKind::Date, true)];

const INSTALLED_TO_SETTLEMENT: &[FieldRule] = &[
    rule(OrderField::PaymentMethod, FieldKind::Text, true),
    rule(OrderField::SettlementMemo, FieldKind::Text, false),
];

/// Field rules for a `(from, to)` pair. Pairs without an entry have no
/// field gate; the move is governed by the graph alone.
pub fn rules_for(from: OrderStatus, to: OrderStatus) -> &'static [FieldRule] {
    use OrderStatus::*;

    match (from, to) {
        (Inquiry, Quotation) => INQUIRY_TO_QUOTATION,
        (Quotation, Confirmed) => QUOTATION_TO_CONFIRMED,
        (Confirmed, Measurement) => CONFIRMED_TO_MEASUREMENT,
        (Installed, SettlementWait) => INSTALLED_TO_SETTLEMENT,
        _ => NO_RULES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn quotation_gate_requires_an_amount() {
        let rules = rules_for(OrderStatus::Inquiry, OrderStatus::Quotation);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].field, OrderField::QuotationAmount);
        assert!(rules[0].required);
    }

    #[test]
    fn settlement_memo_is_optional() {
        let rules = rules_for(OrderStatus::Installed, OrderStatus::SettlementWait);
        let memo = rules
            .iter()
            .find(|r| r.field == OrderField::SettlementMemo)
            .unwrap();
        assert!(!memo.required);
    }

    #[test]
    fn backward_moves_carry_no_field_gate() {
        for status in OrderStatus::iter() {
            for prev in super::super::graph::backward(status) {
                assert!(rules_for(status, *prev).is_empty());
            }
        }
    }
}
