use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::schedule;
use crate::errors::ServiceError;
use crate::services::schedules::CreateScheduleInput;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct ScheduleListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn create_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateScheduleInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.schedules.create_schedule(user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn list_schedules(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ScheduleListQuery>,
) -> Result<Json<ApiResponse<Vec<schedule::Model>>>, ServiceError> {
    let entries = state
        .schedules
        .list_schedules(user.user_id, query.from, query.to)
        .await?;
    Ok(Json(ApiResponse::ok(entries)))
}

pub async fn list_order_schedules(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<schedule::Model>>>, ServiceError> {
    let entries = state
        .schedules
        .list_for_order(user.user_id, order_id)
        .await?;
    Ok(Json(ApiResponse::ok(entries)))
}

pub async fn complete_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(schedule_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .schedules
        .complete_schedule(user.user_id, schedule_id)
        .await?;
    Ok(Json(ApiResponse::ok(updated)))
}

pub async fn deactivate_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(schedule_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .schedules
        .deactivate_schedule(user.user_id, schedule_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
