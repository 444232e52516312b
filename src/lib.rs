//! Order lifecycle backend for a fit-out installation business.
//!
//! The lifecycle engine in [`lifecycle`] owns every status change; the
//! services own storage; the handlers are a thin HTTP skin over both.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod migrator;
pub mod services;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::lifecycle::LifecycleEngine;
use crate::services::{
    InventoryService, OrderService, OutsourceService, ReadinessService, ScheduleService,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub events: EventSender,
    pub orders: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
    pub schedules: Arc<ScheduleService>,
    pub readiness: Arc<ReadinessService>,
    pub outsource: Arc<OutsourceService>,
    pub engine: Arc<LifecycleEngine>,
}

impl AppState {
    /// Wire services and the engine over one shared connection pool.
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig, events: EventSender) -> Self {
        let orders = Arc::new(OrderService::new(db.clone(), events.clone()));
        let inventory = Arc::new(InventoryService::new(db.clone()));
        let schedules = Arc::new(ScheduleService::new(db.clone()));
        let readiness = Arc::new(ReadinessService::new(db.clone()));
        let outsource = Arc::new(OutsourceService::new(db.clone(), events.clone()));
        let engine = Arc::new(LifecycleEngine::new(
            orders.clone(),
            inventory.clone(),
            schedules.clone(),
            events.clone(),
        ));
        Self {
            db,
            config,
            events,
            orders,
            inventory,
            schedules,
            readiness,
            outsource,
            engine,
        }
    }
}

/// Uniform success envelope; errors render through
/// [`errors::ServiceError`]'s `IntoResponse`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn health_db(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "database": "ok" }))),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "database": "unavailable" })),
            )
        }
    }
}

/// Versioned API router. Health endpoints sit outside the version prefix.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/:id/transition",
            post(handlers::orders::transition_order),
        )
        .route(
            "/orders/:id/missing-fields",
            get(handlers::orders::missing_fields),
        )
        .route(
            "/orders/:id/readiness/quotation",
            get(handlers::orders::quotation_readiness),
        )
        .route(
            "/orders/:id/readiness/outsource",
            get(handlers::orders::outsource_completeness),
        )
        .route(
            "/orders/:id/materials",
            post(handlers::orders::add_material).get(handlers::orders::list_materials),
        )
        .route(
            "/orders/:id/materials/:material_id",
            delete(handlers::orders::remove_material),
        )
        .route(
            "/orders/:id/checklists/:kind/items/:item_id",
            patch(handlers::orders::update_checklist_item),
        )
        .route(
            "/orders/:id/schedules",
            get(handlers::schedules::list_order_schedules),
        )
        .route(
            "/orders/:id/outsource-orders",
            get(handlers::outsource::list_order_outsource),
        )
        .route(
            "/schedules",
            post(handlers::schedules::create_schedule).get(handlers::schedules::list_schedules),
        )
        .route(
            "/schedules/:id/complete",
            post(handlers::schedules::complete_schedule),
        )
        .route(
            "/schedules/:id",
            delete(handlers::schedules::deactivate_schedule),
        )
        .route(
            "/outsource-orders",
            post(handlers::outsource::create_outsource_order),
        )
        .route(
            "/outsource-orders/:id/status",
            post(handlers::outsource::update_outsource_status),
        )
}
