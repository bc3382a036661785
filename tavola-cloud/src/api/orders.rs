//! Order API handlers

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderCreate, OrderDetail, OrderFilter, OrderStatusUpdate, Paginated};
use shared::modules::Module;
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/status", post(set_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Orders),
        ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Paginated<Order>> {
    let (orders, total, window) = db::orders::list(&state.pool, &user.company_id, &filter).await?;
    Ok(Json(window.wrap(orders, total)))
}

/// Lines are priced from the live menu; client-sent prices are never trusted.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<OrderCreate>,
) -> ApiResult<OrderDetail> {
    if data.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }
    data.validate()?;

    let detail = db::orders::create(&state.pool, &user.company_id, &data).await?;
    tracing::info!(
        company_id = %user.company_id,
        order_id = detail.order.id,
        lines = detail.items.len(),
        total = %detail.order.total,
        "Order created"
    );
    Ok(Json(detail))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    let detail = db::orders::find_detail(&state.pool, &user.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(detail))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    let order = db::orders::set_status(&state.pool, &user.company_id, id, req.status).await?;

    db::audit::log(
        &state.pool,
        &user.company_id,
        Some(user.user_id),
        "order.status_changed",
        Some(serde_json::json!({ "order_id": id, "status": req.status.as_db() })),
    )
    .await;
    Ok(Json(order))
}
