//! Storefront theme settings (dashboard side)

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use shared::models::{ThemeSettings, ThemeUpdate};
use shared::modules::Module;
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/settings/theme", get(get_theme).put(update_theme))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Settings),
        ))
}

pub async fn get_theme(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<ThemeSettings> {
    let settings = state
        .theme_cache
        .get_or_load(&state.pool, &user.company_id)
        .await?;
    Ok(Json(settings.as_ref().clone()))
}

/// Partial update; every save bumps `version` so storefront ETags change
pub async fn update_theme(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(data): Json<ThemeUpdate>,
) -> ApiResult<ThemeSettings> {
    data.validate()?;

    let mut settings = db::settings::find(&state.pool, &user.company_id)
        .await?
        .unwrap_or_else(|| ThemeSettings::defaults(&user.company_id));
    data.apply_to(&mut settings);

    let saved = db::settings::save(&state.pool, &settings, shared::util::now_millis()).await?;
    state.theme_cache.insert(saved.clone());

    db::audit::log(
        &state.pool,
        &user.company_id,
        Some(user.user_id),
        "settings.theme_updated",
        Some(serde_json::json!({ "version": saved.version })),
    )
    .await;
    Ok(Json(saved))
}
