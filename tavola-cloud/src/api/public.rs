//! Public storefront API (no authentication)
//!
//! Everything is addressed by company slug. Only companies whose status
//! allows a storefront are served; others look like they do not exist.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BlogPost, CarouselImage, Company, ContactSubmission, ContactSubmissionCreate, FaqItem,
    MenuSection, PageWindow, Paginated, PricingPackage, Reservation, ReservationCreate,
    ReservationStatus, Testimonial, if_none_match_hits,
};
use shared::tenant::CompanyStatus;
use shared::util::now_millis;
use validator::Validate;

use super::ApiResult;
use crate::auth::rate_limit::submission_rate_limit;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let submissions = Router::new()
        .route("/api/public/{slug}/contact", post(submit_contact))
        .route("/api/public/{slug}/reservations", post(request_reservation))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            submission_rate_limit,
        ));

    Router::new()
        .route("/api/public/packages", get(list_packages))
        .route("/api/public/{slug}/theme", get(theme))
        .route("/api/public/{slug}/menu", get(menu))
        .route("/api/public/{slug}/blog", get(blog_posts))
        .route("/api/public/{slug}/blog/{post_slug}", get(blog_post))
        .route("/api/public/{slug}/faq", get(faq))
        .route("/api/public/{slug}/carousel", get(carousel))
        .route("/api/public/{slug}/testimonials", get(testimonials))
        .merge(submissions)
}

/// Resolve a storefront slug, hiding companies that are not publicly visible
async fn storefront_company(state: &AppState, slug: &str) -> Result<Company, ServiceError> {
    let company = db::companies::find_by_slug(&state.pool, slug)
        .await?
        .filter(|c| CompanyStatus::from_db(&c.status).is_some_and(|s| s.storefront_visible()))
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound).with_detail("slug", slug))?;
    Ok(company)
}

/// Active pricing packages for the marketing site
pub async fn list_packages(State(state): State<AppState>) -> ApiResult<Vec<PricingPackage>> {
    Ok(Json(db::packages::list(&state.pool, true).await?))
}

/// Theme with `ETag` revalidation; a matching `If-None-Match` yields 304
pub async fn theme(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let company = storefront_company(&state, &slug).await?;
    let settings = state.theme_cache.get_or_load(&state.pool, &company.id).await?;
    let etag = settings.etag();

    let cache_headers = [
        (header::ETAG, etag.clone()),
        (header::CACHE_CONTROL, "no-cache".to_string()),
    ];

    let fresh = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| if_none_match_hits(v, &etag));
    if fresh {
        return Ok((StatusCode::NOT_MODIFIED, cache_headers).into_response());
    }

    Ok((cache_headers, Json(settings.as_ref().clone())).into_response())
}

pub async fn menu(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<MenuSection>> {
    let company = storefront_company(&state, &slug).await?;
    Ok(Json(db::menu::public_menu(&state.pool, &company.id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicBlogQuery {
    pub category_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn blog_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(q): Query<PublicBlogQuery>,
) -> ApiResult<Paginated<BlogPost>> {
    let company = storefront_company(&state, &slug).await?;
    let window = PageWindow::new(q.page, q.per_page);
    let (posts, total) =
        db::blog::list_published(&state.pool, &company.id, q.category_id, window).await?;
    Ok(Json(window.wrap(posts, total)))
}

pub async fn blog_post(
    State(state): State<AppState>,
    Path((slug, post_slug)): Path<(String, String)>,
) -> ApiResult<BlogPost> {
    let company = storefront_company(&state, &slug).await?;
    let post = db::blog::find_published_by_slug(&state.pool, &company.id, &post_slug)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BlogPostNotFound))?;
    Ok(Json(post))
}

pub async fn faq(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<FaqItem>> {
    let company = storefront_company(&state, &slug).await?;
    Ok(Json(db::faq::list(&state.pool, &company.id, true).await?))
}

pub async fn carousel(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<CarouselImage>> {
    let company = storefront_company(&state, &slug).await?;
    Ok(Json(db::carousel::list(&state.pool, &company.id, true).await?))
}

pub async fn testimonials(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<Testimonial>> {
    let company = storefront_company(&state, &slug).await?;
    Ok(Json(
        db::testimonials::list(&state.pool, &company.id, true).await?,
    ))
}

pub async fn submit_contact(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(data): Json<ContactSubmissionCreate>,
) -> ApiResult<ContactSubmission> {
    data.validate()?;
    let company = storefront_company(&state, &slug).await?;
    let contact = db::contacts::create(&state.pool, &company.id, &data, now_millis()).await?;
    tracing::info!(company_id = %company.id, contact_id = contact.id, "Contact form submitted");
    Ok(Json(contact))
}

/// Storefront booking request; staff confirm it from the dashboard
pub async fn request_reservation(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(data): Json<ReservationCreate>,
) -> ApiResult<Reservation> {
    data.validate()?;
    let company = storefront_company(&state, &slug).await?;
    let reservation =
        db::reservations::create(&state.pool, &company.id, &data, ReservationStatus::Pending)
            .await?;
    tracing::info!(
        company_id = %company.id,
        reservation_id = reservation.id,
        "Reservation requested from storefront"
    );
    Ok(Json(reservation))
}
