//! FAQ entries

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{FaqItem, FaqItemCreate, FaqItemUpdate};
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
        .route("/api/faq", get(list_faq).post(create_faq))
        .route("/api/faq/{id}", put(update_faq).delete(delete_faq))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Faq),
        ))
}

pub async fn list_faq(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<FaqItem>> {
    Ok(Json(
        db::faq::list(&state.pool, &user.company_id, false).await?,
    ))
}

pub async fn create_faq(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<FaqItemCreate>,
) -> ApiResult<FaqItem> {
    data.validate()?;
    let item = db::faq::create(&state.pool, &user.company_id, &data, now_millis()).await?;
    Ok(Json(item))
}

pub async fn update_faq(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<FaqItemUpdate>,
) -> ApiResult<FaqItem> {
    data.validate()?;
    let item = db::faq::update(&state.pool, &user.company_id, id, &data, now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::FaqNotFound))?;
    Ok(Json(item))
}

pub async fn delete_faq(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::faq::delete(&state.pool, &user.company_id, id).await? {
        return Err(AppError::new(ErrorCode::FaqNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
