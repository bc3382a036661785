//! Blog management (dashboard side)
//!
//! The storefront reads published posts through `public`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BlogCategory, BlogCategoryCreate, BlogCategoryUpdate, BlogPost, BlogPostCreate,
    BlogPostFilter, BlogPostUpdate, Paginated,
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
            "/api/blog/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/blog/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .route("/api/blog/posts", get(list_posts).post(create_post))
        .route(
            "/api/blog/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Blog),
        ))
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<BlogCategory>> {
    Ok(Json(
        db::blog::list_categories(&state.pool, &user.company_id).await?,
    ))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<BlogCategoryCreate>,
) -> ApiResult<BlogCategory> {
    data.validate()?;
    let category =
        db::blog::create_category(&state.pool, &user.company_id, &data, now_millis()).await?;
    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<BlogCategoryUpdate>,
) -> ApiResult<BlogCategory> {
    data.validate()?;
    let category = db::blog::update_category(&state.pool, &user.company_id, id, &data)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BlogCategoryNotFound))?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::blog::delete_category(&state.pool, &user.company_id, id).await? {
        return Err(AppError::new(ErrorCode::BlogCategoryNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Drafts included; newest first
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<BlogPostFilter>,
) -> ApiResult<Paginated<BlogPost>> {
    let (posts, total, window) =
        db::blog::list_posts(&state.pool, &user.company_id, &filter).await?;
    Ok(Json(window.wrap(posts, total)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<BlogPost> {
    let post = db::blog::find_post(&state.pool, &user.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BlogPostNotFound))?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<BlogPostCreate>,
) -> ApiResult<BlogPost> {
    data.validate()?;
    let post = db::blog::create_post(
        &state.pool,
        &user.company_id,
        user.user_id,
        &data,
        now_millis(),
    )
    .await?;
    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<BlogPostUpdate>,
) -> ApiResult<BlogPost> {
    data.validate()?;
    let post = db::blog::update_post(&state.pool, &user.company_id, id, &data, now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BlogPostNotFound))?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::blog::soft_delete_post(&state.pool, &user.company_id, id, now_millis()).await? {
        return Err(AppError::new(ErrorCode::BlogPostNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
