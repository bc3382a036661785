//! Reservation API handlers
//!
//! Bookings made from the dashboard start out confirmed and are therefore
//! checked against other confirmed bookings immediately. Storefront
//! bookings (see `public`) start pending and are checked again on confirm.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Paginated, Reservation, ReservationCreate, ReservationFilter, ReservationStatus,
    ReservationStatusUpdate, ReservationUpdate,
};
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
            "/api/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route(
            "/api/reservations/{id}",
            get(get_reservation)
                .put(update_reservation)
                .delete(delete_reservation),
        )
        .route("/api/reservations/{id}/status", post(set_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Reservations),
        ))
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<ReservationFilter>,
) -> ApiResult<Paginated<Reservation>> {
    let (items, total, window) =
        db::reservations::list(&state.pool, &user.company_id, &filter).await?;
    Ok(Json(window.wrap(items, total)))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<ReservationCreate>,
) -> ApiResult<Reservation> {
    data.validate()?;
    let reservation = db::reservations::create(
        &state.pool,
        &user.company_id,
        &data,
        ReservationStatus::Confirmed,
    )
    .await?;

    tracing::info!(
        company_id = %user.company_id,
        reservation_id = reservation.id,
        table_id = reservation.table_id,
        "Reservation created"
    );
    Ok(Json(reservation))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Reservation> {
    let reservation = db::reservations::find_by_id(&state.pool, &user.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound))?;
    Ok(Json(reservation))
}

pub async fn update_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<ReservationUpdate>,
) -> ApiResult<Reservation> {
    data.validate()?;
    let reservation = db::reservations::update(&state.pool, &user.company_id, id, &data).await?;
    Ok(Json(reservation))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ReservationStatusUpdate>,
) -> ApiResult<Reservation> {
    let reservation =
        db::reservations::set_status(&state.pool, &user.company_id, id, req.status).await?;

    db::audit::log(
        &state.pool,
        &user.company_id,
        Some(user.user_id),
        "reservation.status_changed",
        Some(serde_json::json!({ "reservation_id": id, "status": req.status.as_db() })),
    )
    .await;
    Ok(Json(reservation))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::reservations::delete(&state.pool, &user.company_id, id).await? {
        return Err(AppError::new(ErrorCode::ReservationNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
