//! API routes for tavola-cloud
//!
//! Route groups:
//! - `/health`, `/api/auth/*`, `/api/public/*`, `/stripe/webhook`: no JWT
//! - everything else under `/api`: `user_auth_middleware`, then a
//!   per-group `require_module` / `require_role` gate

pub mod audit;
pub mod auth;
pub mod billing;
pub mod blog;
pub mod carousel;
pub mod company;
pub mod contacts;
pub mod dashboard;
pub mod faq;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod packages;
pub mod public;
pub mod reservations;
pub mod settings;
pub mod stripe_webhook;
pub mod tables;
pub mod testimonials;
pub mod tickets;
pub mod users;

use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::user_auth_middleware;
use crate::config::Config;
use crate::error::ServiceError;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Query string for list endpoints without other filters
#[derive(Debug, Default, serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create the combined router
pub fn create_router(state: AppState, config: &Config) -> Router {
    let protected = Router::new()
        .merge(auth::me_router())
        .merge(company::router(&state))
        .merge(users::router(&state))
        .merge(tables::router(&state))
        .merge(reservations::router(&state))
        .merge(menu::router(&state))
        .merge(inventory::router(&state))
        .merge(orders::router(&state))
        .merge(blog::router(&state))
        .merge(faq::router(&state))
        .merge(carousel::router(&state))
        .merge(testimonials::router(&state))
        .merge(contacts::router(&state))
        .merge(tickets::router(&state))
        .merge(settings::router(&state))
        .merge(billing::router(&state))
        .merge(packages::router(&state))
        .merge(audit::router(&state))
        .merge(dashboard::router(&state))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router(&state))
        .merge(public::router(&state))
        .merge(stripe_webhook::router())
        .merge(protected)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        if config.is_development() {
            return CorsLayer::permissive();
        }
        tracing::warn!("CORS_ALLOWED_ORIGINS is empty, cross-origin requests are refused");
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::IF_NONE_MATCH,
        ])
        .expose_headers([header::ETAG])
}
