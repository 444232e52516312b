use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::requirements::{FieldKind, FieldRule, OrderField};
use super::status::OrderStatus;

/// The slice of an order the lifecycle engine reasons about. Produced from
/// the `orders` row by the production store and constructed directly by
/// test fakes; the engine itself never touches the database schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub quotation_amount: Option<Decimal>,
    pub confirmed_amount: Option<Decimal>,
    pub measurement_date: Option<NaiveDate>,
    pub installation_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub settlement_memo: Option<String>,
}

impl OrderSnapshot {
    /// Whether the snapshot satisfies one row of the requirements table.
    /// Optional rules are always satisfied; they exist so callers can render
    /// the full form for a gate.
    pub fn satisfies(&self, rule: &FieldRule) -> bool {
        if !rule.required {
            return true;
        }
        match (rule.field, rule.kind) {
            (OrderField::QuotationAmount, FieldKind::Money) => {
                self.quotation_amount.is_some_and(|v| v > Decimal::ZERO)
            }
            (OrderField::ConfirmedAmount, FieldKind::Money) => {
                self.confirmed_amount.is_some_and(|v| v > Decimal::ZERO)
            }
            (OrderField::MeasurementDate, FieldKind::Date) => self.measurement_date.is_some(),
            (OrderField::InstallationDate, FieldKind::Date) => self.installation_date.is_some(),
            (OrderField::PaymentMethod, FieldKind::Text) => self
                .payment_method
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty()),
            (OrderField::SettlementMemo, FieldKind::Text) => self
                .settlement_memo
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty()),
            // A mismatched kind in the table is a programming error; treat
            // the field as unsatisfied so it surfaces during testing.
            _ => false,
        }
    }
}
