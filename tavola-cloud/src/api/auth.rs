//! Authentication API handlers
//!
//! POST /api/auth/register: create company + owner, return a JWT
//! POST /api/auth/login: email/password login, return a JWT
//! GET  /api/auth/me: caller, company and effective modules

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Company, LoginRequest, RegisterRequest, User};
use shared::modules::{Module, Role};
use shared::tenant::CompanyStatus;
use validator::Validate;

use super::ApiResult;
use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::auth::{CurrentUser, user_auth};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

/// Slug tried when a company name has no ASCII letters or digits
const FALLBACK_SLUG: &str = "restaurant";
const MAX_SLUG_ATTEMPTS: u32 = 50;

pub fn router(state: &AppState) -> Router<AppState> {
    let register_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));
    let login_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));
    register_routes.merge(login_routes)
}

/// Authenticated part; mounted under `user_auth_middleware`
pub fn me_router() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(me))
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub company: Company,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
    pub company: Company,
    pub modules: Vec<Module>,
}

/// `base`, `base-2`, `base-3`, ...
fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

async fn unique_slug(state: &AppState, company_name: &str) -> Result<String, ServiceError> {
    let mut base = shared::util::slugify(company_name);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = slug_candidate(&base, attempt);
        if !db::companies::slug_exists(&state.pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::new(ErrorCode::CompanySlugExists)
        .with_detail("slug", base)
        .into())
}

fn issue_token(state: &AppState, user: &User, role: Role) -> Result<String, ServiceError> {
    user_auth::create_token(user.id, &user.company_id, role, &user.email, &state.jwt_secret).map_err(
        |e| {
            tracing::error!("JWT creation failed: {e}");
            ServiceError::App(AppError::new(ErrorCode::InternalError))
        },
    )
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!("Password hash error: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    req.validate()?;
    let email = shared::util::normalize_email(&req.email);

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into());
    }

    let slug = unique_slug(&state, &req.company_name).await?;
    let password_hash = hash(&req.password)?;
    let company_id = uuid::Uuid::new_v4().to_string();
    let owner_id = shared::util::snowflake_id();
    let now = shared::util::now_millis();

    db::companies::create_with_owner(
        &state.pool,
        &db::companies::NewCompany {
            id: &company_id,
            name: req.company_name.trim(),
            slug: &slug,
            email: &email,
            owner_id,
            owner_name: req.name.trim(),
            owner_password_hash: &password_hash,
            now,
        },
    )
    .await?;

    let company = db::companies::find_by_id(&state.pool, &company_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    let user = db::users::find_by_id(&state.pool, &company_id, owner_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    let token = issue_token(&state, &user, Role::Owner)?;

    db::audit::log(&state.pool, &company_id, Some(owner_id), "company.registered", None).await;
    tracing::info!(company_id = %company_id, slug = %slug, "Company registered");

    Ok(Json(AuthResponse {
        token,
        user,
        company,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = shared::util::normalize_email(&req.email);
    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &user.password_hash) {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(AppError::new(ErrorCode::InvalidCredentials).into());
    }
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled).into());
    }

    let company = db::companies::find_by_id(&state.pool, &user.company_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    let can_login = CompanyStatus::from_db(&company.status).is_some_and(|s| s.can_login());
    if !can_login {
        return Err(AppError::new(ErrorCode::CompanyInactive)
            .with_detail("status", company.status.clone())
            .into());
    }

    let role = Role::from_db(&user.role)
        .ok_or_else(|| ServiceError::Db(format!("Unknown role '{}'", user.role).into()))?;
    let token = issue_token(&state, &user, role)?;

    let now = shared::util::now_millis();
    db::users::touch_login(&state.pool, user.id, now).await?;
    db::audit::log(&state.pool, &company.id, Some(user.id), "user.login", None).await;

    Ok(Json(AuthResponse {
        token,
        user,
        company,
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claimed): Extension<CurrentUser>,
) -> ApiResult<MeResponse> {
    let current = state.module_cache.refresh_user(&state.pool, &claimed).await?;
    let user = db::users::find_by_id(&state.pool, &current.company_id, current.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    let company = db::companies::find_by_id(&state.pool, &current.company_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    let access = state
        .module_cache
        .get_or_load(&state.pool, &current.company_id)
        .await?;

    Ok(Json(MeResponse {
        modules: access.modules_for(current.role),
        user,
        company,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_candidates() {
        assert_eq!(slug_candidate("trattoria-roma", 1), "trattoria-roma");
        assert_eq!(slug_candidate("trattoria-roma", 2), "trattoria-roma-2");
        assert_eq!(slug_candidate("x", 10), "x-10");
    }
}
