//! Company user management
//!
//! Owners and admins manage staff accounts. Only assignable roles
//! (admin, manager, staff) can be handed out and only the owner may
//! create or manage admins. The owner account is never changed by others.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::{User, UserCreate, UserUpdate};
use shared::modules::{Module, Role};
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::db;
use crate::db::users::{NewUser, UserChanges};
use crate::error::ServiceError;
use crate::state::AppState;
use crate::util::hash_password;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Users),
        ))
}

/// Whether `actor` may give someone the role `role`
fn check_assignable(actor: &CurrentUser, role: Role) -> Result<(), AppError> {
    if !role.is_assignable() {
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            format!("Role '{}' cannot be assigned", role.as_db()),
        ));
    }
    if role == Role::Admin && !actor.is_owner() {
        return Err(AppError::new(ErrorCode::RoleRequired).with_detail("required", "owner"));
    }
    Ok(())
}

/// Whether `actor` may modify or delete `target`
fn check_manageable(actor: &CurrentUser, target: &User) -> Result<(), AppError> {
    let target_role = Role::from_db(&target.role);
    if target_role == Some(Role::Owner) && target.id != actor.user_id {
        return Err(AppError::new(ErrorCode::CannotModifyOwner));
    }
    if target_role == Some(Role::Admin) && !actor.is_owner() && target.id != actor.user_id {
        return Err(AppError::new(ErrorCode::RoleRequired).with_detail("required", "owner"));
    }
    Ok(())
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<User>> {
    let users = db::users::list(&state.pool, &user.company_id).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Json(data): Json<UserCreate>,
) -> ApiResult<User> {
    data.validate()?;
    check_assignable(&actor, data.role)?;

    let email = shared::util::normalize_email(&data.email);
    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::UserEmailExists).into());
    }

    let password_hash = hash_password(&data.password).map_err(|e| {
        tracing::error!("Password hash error: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    let user = db::users::create(
        &state.pool,
        &NewUser {
            id: shared::util::snowflake_id(),
            company_id: &actor.company_id,
            email: &email,
            name: data.name.trim(),
            password_hash: &password_hash,
            role: data.role.as_db(),
            now: shared::util::now_millis(),
        },
    )
    .await?;

    db::audit::log(
        &state.pool,
        &actor.company_id,
        Some(actor.user_id),
        "user.created",
        Some(serde_json::json!({ "user_id": user.id, "role": user.role })),
    )
    .await;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(data): Json<UserUpdate>,
) -> ApiResult<User> {
    data.validate()?;
    let target = db::users::find_by_id(&state.pool, &actor.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    check_manageable(&actor, &target)?;

    if let Some(role) = data.role {
        if target.role == Role::Owner.as_db() {
            return Err(AppError::new(ErrorCode::CannotModifyOwner).into());
        }
        check_assignable(&actor, role)?;
    }
    if data.is_active == Some(false) && target.id == actor.user_id {
        return Err(AppError::with_message(
            ErrorCode::CannotDeleteSelf,
            "Cannot deactivate your own account",
        )
        .into());
    }

    let password_hash = data
        .password
        .as_deref()
        .map(hash_password)
        .transpose()
        .map_err(|e| ServiceError::Db(e.to_string().into()))?;

    let changes = UserChanges {
        name: data.name.as_deref().map(str::trim),
        password_hash: password_hash.as_deref(),
        role: data.role.map(|r| r.as_db()),
        is_active: data.is_active,
    };
    let user = db::users::update(
        &state.pool,
        &actor.company_id,
        id,
        &changes,
        shared::util::now_millis(),
    )
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    state.module_cache.invalidate_account(id).await;

    db::audit::log(
        &state.pool,
        &actor.company_id,
        Some(actor.user_id),
        "user.updated",
        Some(serde_json::json!({
            "user_id": id,
            "role": changes.role,
            "is_active": changes.is_active,
            "password_changed": changes.password_hash.is_some(),
        })),
    )
    .await;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if id == actor.user_id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf).into());
    }
    let target = db::users::find_by_id(&state.pool, &actor.company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    check_manageable(&actor, &target)?;

    let now = shared::util::now_millis();
    if !db::users::soft_delete(&state.pool, &actor.company_id, id, now).await? {
        return Err(AppError::new(ErrorCode::UserNotFound).into());
    }
    state.module_cache.invalidate_account(id).await;

    db::audit::log(
        &state.pool,
        &actor.company_id,
        Some(actor.user_id),
        "user.deleted",
        Some(serde_json::json!({ "user_id": id })),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> CurrentUser {
        CurrentUser {
            user_id: 1,
            company_id: "c1".into(),
            role,
            email: "a@example.com".into(),
        }
    }

    fn target(id: i64, role: Role) -> User {
        User {
            id,
            company_id: "c1".into(),
            email: "t@example.com".into(),
            name: "T".into(),
            password_hash: String::new(),
            role: role.as_db().into(),
            is_active: true,
            last_login_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_assignable_roles() {
        let owner = actor(Role::Owner);
        let admin = actor(Role::Admin);
        assert!(check_assignable(&owner, Role::Admin).is_ok());
        assert!(check_assignable(&admin, Role::Staff).is_ok());
        assert_eq!(
            check_assignable(&admin, Role::Admin).unwrap_err().code,
            ErrorCode::RoleRequired
        );
        assert_eq!(
            check_assignable(&owner, Role::Owner).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        assert!(check_assignable(&owner, Role::PlatformAdmin).is_err());
    }

    #[test]
    fn test_owner_protected_from_others() {
        let admin = actor(Role::Admin);
        let err = check_manageable(&admin, &target(9, Role::Owner)).unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotModifyOwner);

        let owner = actor(Role::Owner);
        assert!(check_manageable(&owner, &target(1, Role::Owner)).is_ok());
    }

    #[test]
    fn test_admins_managed_by_owner_only() {
        assert!(check_manageable(&actor(Role::Admin), &target(5, Role::Admin)).is_err());
        assert!(check_manageable(&actor(Role::Owner), &target(5, Role::Admin)).is_ok());
        assert!(check_manageable(&actor(Role::Admin), &target(5, Role::Staff)).is_ok());
    }
}
