//! Menu categories and items

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, MenuItem, MenuItemCreate,
    MenuItemFilter, MenuItemUpdate, Paginated,
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
        .route(
            "/api/menu/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/menu/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .route("/api/menu/items", get(list_items).post(create_item))
        .route(
            "/api/menu/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Menu),
        ))
}

fn check_price(price: Option<Decimal>) -> Result<(), AppError> {
    match price {
        Some(p) if p.is_sign_negative() && !p.is_zero() => Err(AppError::new(
            ErrorCode::InvalidPrice,
        )
        .with_detail("price", p.to_string())),
        _ => Ok(()),
    }
}

// ── Categories ──

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<MenuCategory>> {
    let categories = db::menu::list_categories(&state.pool, &user.company_id).await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<MenuCategoryCreate>,
) -> ApiResult<MenuCategory> {
    data.validate()?;
    let category =
        db::menu::create_category(&state.pool, &user.company_id, &data, now_millis()).await?;
    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<MenuCategoryUpdate>,
) -> ApiResult<MenuCategory> {
    data.validate()?;
    let category =
        db::menu::update_category(&state.pool, &user.company_id, id, &data, now_millis())
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
    Ok(Json(category))
}

/// Refused with 409 while the category still holds items
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    db::menu::delete_category(&state.pool, &user.company_id, id).await?;
    db::audit::log(
        &state.pool,
        &user.company_id,
        Some(user.user_id),
        "menu.category_deleted",
        Some(serde_json::json!({ "category_id": id })),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

// ── Items ──

pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<MenuItemFilter>,
) -> ApiResult<Paginated<MenuItem>> {
    let (items, total, window) =
        db::menu::list_items(&state.pool, &user.company_id, &filter).await?;
    Ok(Json(window.wrap(items, total)))
}

pub async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<MenuItem> {
    let item = db::menu::find_item(&state.pool, &user.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound))?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<MenuItemCreate>,
) -> ApiResult<MenuItem> {
    data.validate()?;
    check_price(Some(data.price))?;
    let item = db::menu::create_item(&state.pool, &user.company_id, &data, now_millis()).await?;
    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    data.validate()?;
    check_price(data.price)?;
    let item = db::menu::update_item(&state.pool, &user.company_id, id, &data, now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound))?;
    Ok(Json(item))
}

/// Soft delete; past orders keep their snapshot of the item
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::menu::soft_delete_item(&state.pool, &user.company_id, id, now_millis()).await? {
        return Err(AppError::new(ErrorCode::MenuItemNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_price() {
        assert!(check_price(None).is_ok());
        assert!(check_price(Some(Decimal::ZERO)).is_ok());
        assert!(check_price(Some(Decimal::new(1250, 2))).is_ok());
        let err = check_price(Some(Decimal::new(-1, 2))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrice);
    }
}
