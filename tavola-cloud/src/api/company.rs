//! Company profile
//!
//! GET /api/company, PUT /api/company

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{Company, CompanyUpdate};
use shared::modules::Module;
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/company", get(get_company).put(update_company))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Settings),
        ))
}

pub async fn get_company(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Company> {
    let company = db::companies::find_by_id(&state.pool, &user.company_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    Ok(Json(company))
}

pub async fn update_company(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(mut data): Json<CompanyUpdate>,
) -> ApiResult<Company> {
    data.validate()?;
    data.email = data.email.as_deref().map(shared::util::normalize_email);

    let now = shared::util::now_millis();
    let company = db::companies::update(&state.pool, &user.company_id, &data, now)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;

    db::audit::log(
        &state.pool,
        &user.company_id,
        Some(user.user_id),
        "company.updated",
        serde_json::to_value(&data).ok(),
    )
    .await;
    Ok(Json(company))
}
