use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::outsource_order;
use crate::errors::ServiceError;
use crate::lifecycle::OutsourceStatus;
use crate::services::outsource::CreateOutsourceInput;
use crate::{ApiResponse, AppState};

pub async fn create_outsource_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateOutsourceInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.outsource.create(user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn list_order_outsource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<outsource_order::Model>>>, ServiceError> {
    let records = state
        .outsource
        .list_for_order(user.user_id, order_id)
        .await?;
    Ok(Json(ApiResponse::ok(records)))
}

#[derive(Debug, Deserialize)]
pub struct OutsourceStatusRequest {
    pub status: OutsourceStatus,
}

pub async fn update_outsource_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(outsource_id): Path<Uuid>,
    Json(request): Json<OutsourceStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .outsource
        .update_status(user.user_id, outsource_id, request.status)
        .await?;
    Ok(Json(ApiResponse::ok(updated)))
}
