use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::order::{self, parse_checklist, ChecklistItem};
use crate::entities::order_material;
use crate::errors::ServiceError;
use crate::events::StaleView;
use crate::lifecycle::{requirements::FieldRule, HoldOutcome, OrderStatus};
use crate::services::orders::{ChecklistKind, CreateOrderInput, UpdateOrderFields};
use crate::{ApiResponse, AppState};

/// Order as callers see it: typed status, checklists parsed out of their
/// JSON columns.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub quotation_amount: Option<rust_decimal::Decimal>,
    pub confirmed_amount: Option<rust_decimal::Decimal>,
    pub measurement_date: Option<chrono::NaiveDate>,
    pub installation_date: Option<chrono::NaiveDate>,
    pub payment_method: Option<String>,
    pub settlement_memo: Option<String>,
    pub preparation_checklist: Vec<ChecklistItem>,
    pub installation_checklist: Vec<ChecklistItem>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

impl OrderResponse {
    pub fn from_model(model: order::Model) -> Result<Self, ServiceError> {
        Ok(Self {
            status: model.status()?,
            id: model.id,
            order_number: model.order_number,
            customer_id: model.customer_id,
            quotation_amount: model.quotation_amount,
            confirmed_amount: model.confirmed_amount,
            measurement_date: model.measurement_date,
            installation_date: model.installation_date,
            payment_method: model.payment_method,
            settlement_memo: model.settlement_memo,
            preparation_checklist: parse_checklist(&model.preparation_checklist),
            installation_checklist: parse_checklist(&model.installation_checklist),
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize)]
pub struct PaginatedOrders {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.orders.create_order(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(OrderResponse::from_model(created)?)),
    ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .orders
        .list_orders(user.user_id, query.page, query.limit)
        .await?;
    let orders = items
        .into_iter()
        .map(OrderResponse::from_model)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(ApiResponse::ok(PaginatedOrders {
        orders,
        total,
        page: query.page,
        limit: query.limit,
    })))
}

pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let model = state.orders.get_order(user.user_id, order_id).await?;
    Ok(Json(ApiResponse::ok(OrderResponse::from_model(model)?)))
}

/// Field update. Dates feed the calendar, so schedule sync runs afterwards;
/// its failure is logged, never surfaced here.
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(fields): Json<UpdateOrderFields>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .orders
        .update_fields(user.user_id, order_id, fields)
        .await?;
    state
        .engine
        .sync_schedules(user.user_id, &updated.snapshot()?)
        .await;
    Ok(Json(ApiResponse::ok(OrderResponse::from_model(updated)?)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.orders.delete_order(user.user_id, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub to: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub order: crate::lifecycle::OrderSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold: Option<HoldOutcome>,
    pub stale_views: Vec<StaleView>,
}

pub async fn transition_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .engine
        .transition(user.user_id, order_id, request.to)
        .await?;
    Ok(Json(ApiResponse::ok(TransitionResponse {
        order: outcome.order,
        hold: outcome.hold,
        stale_views: outcome.stale_views,
    })))
}

#[derive(Debug, Deserialize)]
pub struct MissingFieldsQuery {
    pub to: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct MissingFieldsResponse {
    pub to: OrderStatus,
    /// Every field rule for the gate, optional ones included, so callers
    /// can render the whole form.
    pub form: &'static [FieldRule],
    /// Required fields the order does not satisfy yet. Empty means the
    /// move would pass validation.
    pub missing: Vec<FieldRule>,
}

pub async fn missing_fields(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Query(query): Query<MissingFieldsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let gate = state
        .engine
        .gate_form(user.user_id, order_id, query.to)
        .await?;
    Ok(Json(ApiResponse::ok(MissingFieldsResponse {
        to: query.to,
        form: gate.form,
        missing: gate.missing,
    })))
}

pub async fn quotation_readiness(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let readiness = state
        .readiness
        .quotation_readiness(user.user_id, order_id)
        .await?;
    Ok(Json(ApiResponse::ok(readiness)))
}

pub async fn outsource_completeness(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let completeness = state
        .readiness
        .outsource_completeness(user.user_id, order_id)
        .await?;
    Ok(Json(ApiResponse::ok(completeness)))
}

#[derive(Debug, Deserialize)]
pub struct AddMaterialRequest {
    pub product_id: Uuid,
    pub planned_quantity: i32,
}

pub async fn add_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<AddMaterialRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let line = state
        .orders
        .add_material(
            user.user_id,
            order_id,
            request.product_id,
            request.planned_quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(line))))
}

pub async fn list_materials(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<order_material::Model>>>, ServiceError> {
    let lines = state.orders.list_materials(user.user_id, order_id).await?;
    Ok(Json(ApiResponse::ok(lines)))
}

pub async fn remove_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path((order_id, material_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .orders
        .remove_material(user.user_id, order_id, material_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ChecklistItemUpdate {
    pub checked: Option<bool>,
    pub note: Option<String>,
}

pub async fn update_checklist_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((order_id, kind, item_id)): Path<(Uuid, ChecklistKind, Uuid)>,
    Json(update): Json<ChecklistItemUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .orders
        .update_checklist_item(
            user.user_id,
            order_id,
            kind,
            item_id,
            update.checked,
            update.note,
        )
        .await?;
    Ok(Json(ApiResponse::ok(OrderResponse::from_model(updated)?)))
}
