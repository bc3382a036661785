//! Dining tables

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};
use shared::modules::Module;
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/tables", get(list_tables).post(create_table))
        .route("/api/tables/{id}", put(update_table).delete(delete_table))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Tables),
        ))
}

pub async fn list_tables(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<DiningTable>> {
    let tables = db::tables::list(&state.pool, &user.company_id).await?;
    Ok(Json(tables))
}

pub async fn create_table(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<DiningTableCreate>,
) -> ApiResult<DiningTable> {
    data.validate()?;
    let table = db::tables::create(
        &state.pool,
        &user.company_id,
        shared::util::snowflake_id(),
        &data,
        shared::util::now_millis(),
    )
    .await?;
    Ok(Json(table))
}

pub async fn update_table(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<DiningTableUpdate>,
) -> ApiResult<DiningTable> {
    data.validate()?;
    let table = db::tables::update(&state.pool, &user.company_id, id, &data)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TableNotFound))?;
    Ok(Json(table))
}

/// Tables referenced by reservations or orders cannot be deleted (400);
/// deactivate them instead.
pub async fn delete_table(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::tables::delete(&state.pool, &user.company_id, id).await? {
        return Err(AppError::new(ErrorCode::TableNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
