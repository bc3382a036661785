//! Customer testimonials

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{Testimonial, TestimonialCreate, TestimonialUpdate};
use shared::modules::Module;
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/testimonials",
            get(list_testimonials).post(create_testimonial),
        )
        .route(
            "/api/testimonials/{id}",
            put(update_testimonial).delete(delete_testimonial),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Content),
        ))
}

pub async fn list_testimonials(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<Testimonial>> {
    Ok(Json(
        db::testimonials::list(&state.pool, &user.company_id, false).await?,
    ))
}

pub async fn create_testimonial(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<TestimonialCreate>,
) -> ApiResult<Testimonial> {
    data.validate()?;
    let testimonial = db::testimonials::create(
        &state.pool,
        &user.company_id,
        &data,
        shared::util::now_millis(),
    )
    .await?;
    Ok(Json(testimonial))
}

pub async fn update_testimonial(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<TestimonialUpdate>,
) -> ApiResult<Testimonial> {
    data.validate()?;
    let testimonial = db::testimonials::update(&state.pool, &user.company_id, id, &data)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TestimonialNotFound))?;
    Ok(Json(testimonial))
}

pub async fn delete_testimonial(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::testimonials::delete(&state.pool, &user.company_id, id).await? {
        return Err(AppError::new(ErrorCode::TestimonialNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
