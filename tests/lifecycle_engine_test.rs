//! End-to-end engine scenarios over the in-memory capability fakes.

mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use rstest::rstest;
use rust_decimal_macros::dec;
use uuid::Uuid;

use fitout_api::errors::ServiceError;
use fitout_api::lifecycle::{OrderStatus, OutsourceStatus, ScheduleType, SyncAction};

use common::{engine, snapshot, FakeWorld};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn multi_hop_jump_is_rejected() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::Inquiry);
    let order_id = order.id;
    world.seed_order(owner, order);

    let err = engine(&world)
        .transition(owner, order_id, OrderStatus::Installed)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidTransition {
            from: OrderStatus::Inquiry,
            to: OrderStatus::Installed,
        }
    );
    assert_eq!(world.order_status(order_id), OrderStatus::Inquiry);
}

#[tokio::test]
async fn quotation_gate_blocks_until_the_amount_is_set() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let mut order = snapshot(OrderStatus::Inquiry);
    let order_id = order.id;
    world.seed_order(owner, order.clone());
    let engine = engine(&world);

    let err = engine
        .transition(owner, order_id, OrderStatus::Quotation)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::MissingRequiredFields(ref fields) if fields.len() == 1);
    assert_eq!(world.order_status(order_id), OrderStatus::Inquiry);

    order.quotation_amount = Some(dec!(2400.00));
    world.seed_order(owner, order);
    let outcome = engine
        .transition(owner, order_id, OrderStatus::Quotation)
        .await
        .unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Quotation);
    assert!(!outcome.stale_views.is_empty());
}

#[tokio::test]
async fn gate_form_reports_only_the_unsatisfied_delta() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let mut order = snapshot(OrderStatus::Quotation);
    order.confirmed_amount = Some(dec!(3100.00));
    let order_id = order.id;
    world.seed_order(owner, order);

    let gate = engine(&world)
        .gate_form(owner, order_id, OrderStatus::Confirmed)
        .await
        .unwrap();
    // The full form keeps both fields; only the unsatisfied one comes back
    // as missing.
    assert_eq!(gate.form.len(), 2);
    assert_eq!(gate.missing.len(), 1);
    assert_eq!(gate.missing[0].field.to_string(), "installation_date");
}

#[tokio::test]
async fn gate_form_rejects_an_unreachable_target() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::Inquiry);
    let order_id = order.id;
    world.seed_order(owner, order);

    let err = engine(&world)
        .gate_form(owner, order_id, OrderStatus::SettlementWait)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
}

#[tokio::test]
async fn optional_settlement_memo_does_not_block_the_gate() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let mut order = snapshot(OrderStatus::Installed);
    order.payment_method = Some("bank_transfer".into());
    let order_id = order.id;
    world.seed_order(owner, order);

    let outcome = engine(&world)
        .transition(owner, order_id, OrderStatus::SettlementWait)
        .await
        .unwrap();
    assert_eq!(outcome.order.status, OrderStatus::SettlementWait);
}

#[tokio::test]
async fn cancelling_twice_is_an_idempotent_success() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::Quotation);
    let order_id = order.id;
    world.seed_order(owner, order);
    let engine = engine(&world);

    let first = engine
        .transition(owner, order_id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(first.order.status, OrderStatus::Cancelled);
    assert_eq!(world.order_status(order_id), OrderStatus::Cancelled);

    let second = engine
        .transition(owner, order_id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(second.order.status, OrderStatus::Cancelled);
    // The no-op path touches nothing, so no views go stale.
    assert!(second.stale_views.is_empty());
}

#[tokio::test]
async fn hold_takes_what_stock_allows_and_records_the_shortage() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::DateFixed);
    let order_id = order.id;
    let product = Uuid::new_v4();
    world.seed_order(owner, order);
    world.add_line(order_id, product, 10);
    world.set_stock(product, 6);

    let outcome = engine(&world)
        .transition(owner, order_id, OrderStatus::MaterialHeld)
        .await
        .unwrap();

    assert_eq!(outcome.order.status, OrderStatus::MaterialHeld);
    let hold = outcome.hold.expect("hold outcome expected");
    assert_eq!(hold.lines.len(), 1);
    assert_eq!(hold.lines[0].held_quantity, 6);
    assert_eq!(hold.lines[0].shortage_quantity, 4);
    assert_eq!(hold.total_shortage(), 4);
    assert_eq!(world.stock(product), 0);
}

#[tokio::test]
async fn dispatch_consumes_held_stock_exactly_once() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::DateFixed);
    let order_id = order.id;
    let product = Uuid::new_v4();
    world.seed_order(owner, order);
    world.add_line(order_id, product, 6);
    world.set_stock(product, 6);
    let engine = engine(&world);

    engine
        .transition(owner, order_id, OrderStatus::MaterialHeld)
        .await
        .unwrap();
    engine
        .transition(owner, order_id, OrderStatus::Installed)
        .await
        .unwrap();

    let line = world.line(order_id, product);
    assert_eq!(line.used, 6);
    assert_eq!(line.held, 0);

    // Step back and forward again: nothing is held, nothing outstanding,
    // so the second pass changes no quantities.
    engine
        .transition(owner, order_id, OrderStatus::MaterialHeld)
        .await
        .unwrap();
    engine
        .transition(owner, order_id, OrderStatus::Installed)
        .await
        .unwrap();

    let line = world.line(order_id, product);
    assert_eq!(line.used, 6);
    assert_eq!(line.held, 0);
    assert_eq!(world.stock(product), 0);
}

#[tokio::test]
async fn cancel_releases_stock_and_cascades_to_dependents() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let mut order = snapshot(OrderStatus::DateFixed);
    order.measurement_date = Some(date("2025-03-10"));
    order.installation_date = Some(date("2025-03-20"));
    let order_id = order.id;
    let product = Uuid::new_v4();
    world.seed_order(owner, order);
    world.add_line(order_id, product, 5);
    world.set_stock(product, 5);
    let in_progress = world.add_outsource(order_id, OutsourceStatus::InProgress);
    let completed = world.add_outsource(order_id, OutsourceStatus::Completed);
    let engine = engine(&world);

    engine
        .transition(owner, order_id, OrderStatus::MaterialHeld)
        .await
        .unwrap();
    assert_eq!(world.stock(product), 0);
    assert_eq!(world.active_schedules(order_id).len(), 2);

    engine
        .transition(owner, order_id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(world.order_status(order_id), OrderStatus::Cancelled);
    assert_eq!(world.stock(product), 5);
    let line = world.line(order_id, product);
    assert_eq!(line.held, 0);
    assert_eq!(line.shortage, 0);
    // Only the non-terminal dependent is swept up.
    assert_eq!(
        world.outsource_status(order_id, in_progress),
        OutsourceStatus::Cancelled
    );
    assert_eq!(
        world.outsource_status(order_id, completed),
        OutsourceStatus::Completed
    );
    // Calendar entries survive as inactive rows.
    assert!(world.active_schedules(order_id).is_empty());
    assert_eq!(world.all_schedules(order_id).len(), 2);
}

#[tokio::test]
async fn cancel_cascade_rechecks_legality_against_the_current_row() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::SettlementWait);
    let order_id = order.id;
    world.seed_order(owner, order);

    // The order reached settlement after the caller last looked at it;
    // the procedure itself must refuse, not trust stale validation.
    use fitout_api::lifecycle::InventoryOps;
    let err = world.cancel_order_cascade(owner, order_id).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidTransition {
            from: OrderStatus::SettlementWait,
            to: OrderStatus::Cancelled,
        }
    );
    assert_eq!(world.order_status(order_id), OrderStatus::SettlementWait);
}

#[tokio::test]
async fn schedule_sync_keeps_one_active_entry_per_visit_type() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let mut order = snapshot(OrderStatus::Quotation);
    order.confirmed_amount = Some(dec!(5200.00));
    order.measurement_date = Some(date("2025-04-01"));
    order.installation_date = Some(date("2025-04-15"));
    let order_id = order.id;
    world.seed_order(owner, order.clone());
    let engine = engine(&world);

    // Confirming puts the measurement visit on the calendar; the
    // installation visit waits for a fixed date.
    engine
        .transition(owner, order_id, OrderStatus::Confirmed)
        .await
        .unwrap();
    let active = world.active_schedules(order_id);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].kind, ScheduleType::Measurement);
    assert_eq!(active[0].date, date("2025-04-01"));

    // A second sync with unchanged dates adds nothing.
    order.status = OrderStatus::Confirmed;
    engine.sync_schedules(owner, &order).await;
    assert_eq!(world.active_schedules(order_id).len(), 1);

    // Moving the date updates the existing entry in place.
    order.measurement_date = Some(date("2025-04-03"));
    engine.sync_schedules(owner, &order).await;
    let active = world.active_schedules(order_id);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].date, date("2025-04-03"));
}

#[tokio::test]
async fn installation_visit_appears_once_the_date_is_fixed() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let mut order = snapshot(OrderStatus::Measurement);
    order.measurement_date = Some(date("2025-04-01"));
    order.installation_date = Some(date("2025-04-15"));
    let order_id = order.id;
    world.seed_order(owner, order);

    engine(&world)
        .transition(owner, order_id, OrderStatus::DateFixed)
        .await
        .unwrap();

    let mut kinds: Vec<ScheduleType> = world
        .active_schedules(order_id)
        .iter()
        .map(|s| s.kind)
        .collect();
    kinds.sort_by_key(|k| k.to_string());
    assert_eq!(kinds, vec![ScheduleType::Installation, ScheduleType::Measurement]);
}

#[tokio::test]
async fn procedure_failure_leaves_the_status_untouched() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::DateFixed);
    let order_id = order.id;
    let product = Uuid::new_v4();
    world.seed_order(owner, order);
    world.add_line(order_id, product, 3);
    world.set_stock(product, 3);
    world.set_fail_procedures(true);

    let err = engine(&world)
        .transition(owner, order_id, OrderStatus::MaterialHeld)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ProcedureFailure(_));
    assert_eq!(world.order_status(order_id), OrderStatus::DateFixed);
    assert_eq!(world.stock(product), 3);
}

#[tokio::test]
async fn foreign_orders_read_as_absent() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let order = snapshot(OrderStatus::Inquiry);
    let order_id = order.id;
    world.seed_order(owner, order);

    let err = engine(&world)
        .transition(stranger, order_id, OrderStatus::Quotation)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[rstest]
#[case(OrderStatus::Quotation, OrderStatus::Inquiry)]
#[case(OrderStatus::Confirmed, OrderStatus::Quotation)]
#[case(OrderStatus::SettlementWait, OrderStatus::Installed)]
#[tokio::test]
async fn backward_moves_need_no_fields(
    #[case] from: OrderStatus,
    #[case] to: OrderStatus,
) {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(from);
    let order_id = order.id;
    world.seed_order(owner, order);

    let outcome = engine(&world).transition(owner, order_id, to).await.unwrap();
    assert_eq!(outcome.order.status, to);
}

#[tokio::test]
async fn terminal_revenue_confirmed_admits_no_moves() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order = snapshot(OrderStatus::RevenueConfirmed);
    let order_id = order.id;
    world.seed_order(owner, order);

    let err = engine(&world)
        .transition(owner, order_id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
}

#[tokio::test]
async fn ensure_visit_reports_what_it_did() {
    let world = FakeWorld::new();
    let owner = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    use fitout_api::lifecycle::ScheduleOps;
    let first = world
        .ensure_visit(owner, order_id, ScheduleType::Measurement, date("2025-05-01"))
        .await
        .unwrap();
    assert_eq!(first, SyncAction::Created);

    let again = world
        .ensure_visit(owner, order_id, ScheduleType::Measurement, date("2025-05-01"))
        .await
        .unwrap();
    assert_eq!(again, SyncAction::Unchanged);

    let moved = world
        .ensure_visit(owner, order_id, ScheduleType::Measurement, date("2025-05-02"))
        .await
        .unwrap();
    assert_eq!(moved, SyncAction::Updated);
}
