//! Audit log viewer (owners and admins)

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use shared::models::{PageWindow, Paginated};
use shared::modules::{Module, Role};

use super::{ApiResult, PageQuery};
use crate::auth::{CurrentUser, require_module, require_role};
use crate::db;
use crate::db::audit::AuditEntry;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/audit", get(list_audit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_role(&[Role::Owner, Role::Admin, Role::PlatformAdmin]),
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Settings),
        ))
}

pub async fn list_audit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Paginated<AuditEntry>> {
    let window = PageWindow::new(q.page, q.per_page);
    let (entries, total) = db::audit::query(&state.pool, &user.company_id, window).await?;
    Ok(Json(window.wrap(entries, total)))
}
