//! Pre-transition legality and required-field checks.
//!
//! The validator only reports; it never mutates order data. Callers collect
//! missing fields through a form, write them, and call the engine again.

use crate::errors::ServiceError;

use super::graph;
use super::requirements::{rules_for, FieldRule};
use super::snapshot::OrderSnapshot;
use super::status::OrderStatus;

/// Rules from the requirements table the order does not currently satisfy.
/// Fields already present are not resurfaced; only the delta comes back.
pub fn missing_fields(order: &OrderSnapshot, target: OrderStatus) -> Vec<FieldRule> {
    rules_for(order.status, target)
        .iter()
        .filter(|rule| rule.required && !order.satisfies(rule))
        .copied()
        .collect()
}

/// Full form description for a gate, including optional fields, so the
/// caller can render the whole form rather than just the missing delta.
pub fn form_fields(from: OrderStatus, target: OrderStatus) -> &'static [FieldRule] {
    rules_for(from, target)
}

/// Decide whether `order` may move to `target` right now.
///
/// Rejects with [`ServiceError::InvalidTransition`] when the move is not a
/// one-hop forward or backward edge, and with
/// [`ServiceError::MissingRequiredFields`] when the gate's mandatory fields
/// are absent or invalid.
pub fn validate(order: &OrderSnapshot, target: OrderStatus) -> Result<(), ServiceError> {
    if !graph::is_legal_move(order.status, target) {
        return Err(ServiceError::InvalidTransition {
            from: order.status,
            to: target,
        });
    }

    let missing = missing_fields(order, target);
    if !missing.is_empty() {
        return Err(ServiceError::MissingRequiredFields(
            missing.into_iter().map(|rule| rule.field).collect(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::lifecycle::requirements::OrderField;

    fn order(status: OrderStatus) -> OrderSnapshot {
        OrderSnapshot {
            id: Uuid::new_v4(),
            order_number: "ORD-20250301-0007".into(),
            status,
            quotation_amount: None,
            confirmed_amount: None,
            measurement_date: None,
            installation_date: None,
            payment_method: None,
            settlement_memo: None,
        }
    }

    #[test]
    fn rejects_multi_hop_jump() {
        let err = validate(&order(OrderStatus::Inquiry), OrderStatus::Installed).unwrap_err();
        assert_matches!(
            err,
            ServiceError::InvalidTransition {
                from: OrderStatus::Inquiry,
                to: OrderStatus::Installed,
            }
        );
    }

    #[test]
    fn reports_missing_quotation_amount() {
        let missing = missing_fields(&order(OrderStatus::Inquiry), OrderStatus::Quotation);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field, OrderField::QuotationAmount);

        let err = validate(&order(OrderStatus::Inquiry), OrderStatus::Quotation).unwrap_err();
        assert_matches!(err, ServiceError::MissingRequiredFields(fields) => {
            assert_eq!(fields, vec![OrderField::QuotationAmount]);
        });
    }

    #[test]
    fn satisfied_fields_are_not_resurfaced() {
        let mut o = order(OrderStatus::Quotation);
        o.confirmed_amount = Some(dec!(2400.00));
        let missing = missing_fields(&o, OrderStatus::Confirmed);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field, OrderField::InstallationDate);

        o.installation_date = NaiveDate::from_ymd_opt(2025, 4, 2);
        assert!(validate(&o, OrderStatus::Confirmed).is_ok());
    }

    #[test]
    fn optional_memo_never_blocks_settlement() {
        let mut o = order(OrderStatus::Installed);
        o.payment_method = Some("card".into());
        assert!(validate(&o, OrderStatus::SettlementWait).is_ok());
    }

    #[test]
    fn form_includes_optional_fields_the_delta_omits() {
        let mut o = order(OrderStatus::Installed);
        o.payment_method = Some("card".into());

        let form = form_fields(OrderStatus::Installed, OrderStatus::SettlementWait);
        assert_eq!(form.len(), 2);

        let missing = missing_fields(&o, OrderStatus::SettlementWait);
        assert!(missing.is_empty());
    }

    #[test]
    fn backward_correction_is_legal() {
        let o = order(OrderStatus::Confirmed);
        assert!(validate(&o, OrderStatus::Quotation).is_ok());
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [OrderStatus::RevenueConfirmed, OrderStatus::Cancelled] {
            let err = validate(&order(terminal), OrderStatus::Inquiry).unwrap_err();
            assert_matches!(err, ServiceError::InvalidTransition { .. });
        }
    }
}
