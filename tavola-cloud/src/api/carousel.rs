use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{CarouselImage, CarouselImageCreate, CarouselImageUpdate};
use shared::modules::Module;
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/carousel", get(list_images).post(create_image))
        .route("/api/carousel/{id}", put(update_image).delete(delete_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Content),
        ))
}

pub async fn list_images(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<CarouselImage>> {
    Ok(Json(
        db::carousel::list(&state.pool, &user.company_id, false).await?,
    ))
}

pub async fn create_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<CarouselImageCreate>,
) -> ApiResult<CarouselImage> {
    data.validate()?;
    let image = db::carousel::create(
        &state.pool,
        &user.company_id,
        &data,
        shared::util::now_millis(),
    )
    .await?;
    Ok(Json(image))
}

pub async fn update_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<CarouselImageUpdate>,
) -> ApiResult<CarouselImage> {
    data.validate()?;
    let image = db::carousel::update(&state.pool, &user.company_id, id, &data)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CarouselImageNotFound))?;
    Ok(Json(image))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::carousel::delete(&state.pool, &user.company_id, id).await? {
        return Err(AppError::new(ErrorCode::CarouselImageNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
