//! Inventory API handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    InventoryFilter, InventoryItem, InventoryItemCreate, InventoryItemUpdate, Paginated,
    StockAdjustment,
};
use shared::modules::Module;
use shared::util::now_millis;
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/inventory", get(list_items).post(create_item))
        .route(
            "/api/inventory/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/inventory/{id}/adjust", post(adjust_stock))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Inventory),
        ))
}

pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<InventoryFilter>,
) -> ApiResult<Paginated<InventoryItem>> {
    let (items, total, window) =
        db::inventory::list(&state.pool, &user.company_id, &filter).await?;
    Ok(Json(window.wrap(items, total)))
}

pub async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<InventoryItem> {
    let item = db::inventory::find_by_id(&state.pool, &user.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InventoryItemNotFound))?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<InventoryItemCreate>,
) -> ApiResult<InventoryItem> {
    data.validate()?;
    if data.quantity.is_some_and(|q| q.is_sign_negative() && !q.is_zero()) {
        return Err(AppError::validation("Quantity cannot be negative")
            .with_detail("field", "quantity")
            .into());
    }
    let item = db::inventory::create(&state.pool, &user.company_id, &data, now_millis()).await?;
    Ok(Json(item))
}

/// Metadata only; quantity changes go through `/adjust`
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<InventoryItemUpdate>,
) -> ApiResult<InventoryItem> {
    data.validate()?;
    let item = db::inventory::update(&state.pool, &user.company_id, id, &data, now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InventoryItemNotFound))?;
    Ok(Json(item))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<StockAdjustment>,
) -> ApiResult<InventoryItem> {
    req.validate()?;
    if req.delta.is_zero() {
        return Err(AppError::validation("Adjustment must be non-zero")
            .with_detail("field", "delta")
            .into());
    }

    let item =
        db::inventory::adjust(&state.pool, &user.company_id, id, req.delta, now_millis()).await?;

    db::audit::log(
        &state.pool,
        &user.company_id,
        Some(user.user_id),
        "inventory.adjusted",
        Some(serde_json::json!({
            "item_id": id,
            "delta": req.delta.to_string(),
            "quantity": item.quantity.to_string(),
            "reason": req.reason,
        })),
    )
    .await;

    if item.is_low_stock() {
        tracing::info!(
            company_id = %user.company_id,
            item_id = id,
            quantity = %item.quantity,
            "Inventory item at or below reorder level"
        );
    }
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::inventory::soft_delete(&state.pool, &user.company_id, id, now_millis()).await? {
        return Err(AppError::new(ErrorCode::InventoryItemNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
