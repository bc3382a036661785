use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use shared::models::DashboardStats;
use shared::modules::Module;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Dashboard),
        ))
}

/// Counters for the dashboard home; "today" is the UTC date
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<DashboardStats> {
    let today = chrono::Utc::now().date_naive();
    Ok(Json(
        db::dashboard::stats(&state.pool, &user.company_id, today).await?,
    ))
}
