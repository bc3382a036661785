//! Support tickets
//!
//! Company users see their own company's tickets. Platform admins see every
//! ticket and their replies are flagged as staff replies.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Paginated, SupportTicket, TicketCreate, TicketDetail, TicketFilter, TicketMessage,
    TicketReply, TicketStatusUpdate,
};
use shared::modules::{Module, Role};
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/{id}", get(get_ticket))
        .route("/api/tickets/{id}/messages", post(add_message))
        .route("/api/tickets/{id}/status", post(set_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Support),
        ))
}

/// Company filter for ticket queries; `None` lifts it for platform admins
fn scope(user: &CurrentUser) -> Option<&str> {
    (user.role != Role::PlatformAdmin).then_some(user.company_id.as_str())
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Paginated<SupportTicket>> {
    let (tickets, total, window) = db::tickets::list(&state.pool, scope(&user), &filter).await?;
    Ok(Json(window.wrap(tickets, total)))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<TicketCreate>,
) -> ApiResult<TicketDetail> {
    data.validate()?;
    let detail = db::tickets::create(&state.pool, &user.company_id, user.user_id, &data).await?;

    tracing::info!(
        company_id = %user.company_id,
        ticket_id = detail.ticket.id,
        priority = %detail.ticket.priority,
        "Support ticket opened"
    );
    Ok(Json(detail))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<TicketDetail> {
    let detail = db::tickets::find_detail(&state.pool, scope(&user), id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TicketNotFound))?;
    Ok(Json(detail))
}

pub async fn add_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<TicketReply>,
) -> ApiResult<TicketMessage> {
    req.validate()?;
    let is_staff_reply = user.role == Role::PlatformAdmin;
    let message = db::tickets::add_message(
        &state.pool,
        scope(&user),
        id,
        user.user_id,
        is_staff_reply,
        &req.body,
    )
    .await?;
    Ok(Json(message))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<TicketStatusUpdate>,
) -> ApiResult<SupportTicket> {
    let ticket = db::tickets::set_status(&state.pool, scope(&user), id, req.status).await?;
    Ok(Json(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            user_id: 1,
            company_id: "c1".into(),
            role,
            email: "a@b.test".into(),
        }
    }

    #[test]
    fn test_scope_by_role() {
        assert_eq!(scope(&user(Role::Owner)), Some("c1"));
        assert_eq!(scope(&user(Role::Staff)), Some("c1"));
        assert_eq!(scope(&user(Role::PlatformAdmin)), None);
    }
}
