//! Contact-form inbox
//!
//! Submissions arrive through the public storefront endpoint.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{ContactFilter, ContactSubmission, Paginated};
use shared::modules::Module;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/contacts", get(list_contacts))
        .route("/api/contacts/{id}", delete(delete_contact))
        .route("/api/contacts/{id}/read", post(mark_read))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Contacts),
        ))
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<ContactFilter>,
) -> ApiResult<Paginated<ContactSubmission>> {
    let (items, total, window) =
        db::contacts::list(&state.pool, &user.company_id, &filter).await?;
    Ok(Json(window.wrap(items, total)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<ContactSubmission> {
    let contact = db::contacts::mark_read(&state.pool, &user.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ContactNotFound))?;
    Ok(Json(contact))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::contacts::delete(&state.pool, &user.company_id, id).await? {
        return Err(AppError::new(ErrorCode::ContactNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
