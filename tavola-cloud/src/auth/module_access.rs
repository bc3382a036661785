//! Module access middleware
//!
//! Gates dashboard sections by the caller's role and the company's plan.
//! Company status, plan features and each account's current role are cached
//! for 5 minutes; billing webhooks and user edits invalidate their entries.
//! The JWT role is only trusted to refuse early: a request that gets past it
//! runs with the role stored on the account, and a deactivated or deleted
//! account is turned away even while its token is still valid.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use shared::modules::{self, Module, Role};
use shared::tenant::CompanyStatus;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::auth::CurrentUser;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

const CACHE_TTL_SECS: u64 = 300;

/// Company status plus the feature list of its active subscription
#[derive(Debug, Clone, PartialEq)]
pub struct TenantAccess {
    pub status: CompanyStatus,
    /// `None` when the company has no active subscription
    pub features: Option<Vec<String>>,
}

impl TenantAccess {
    /// Plan features in force; a suspended company keeps only the always-on set
    pub fn plan_features(&self) -> Option<&[String]> {
        match self.status {
            CompanyStatus::Active => self.features.as_deref(),
            _ => None,
        }
    }

    pub fn modules_for(&self, role: Role) -> Vec<Module> {
        modules::effective_modules(role.as_db(), self.plan_features())
    }
}

/// Stored state of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAccess {
    /// Active account with its current role
    Live(Role),
    /// Deactivated, deleted or carrying an unknown role
    Disabled,
}

impl AccountAccess {
    /// The caller as the account stands now
    pub fn apply(self, claimed: &CurrentUser) -> Result<CurrentUser, AppError> {
        match self {
            Self::Live(role) => Ok(CurrentUser {
                role,
                ..claimed.clone()
            }),
            Self::Disabled => Err(AppError::new(ErrorCode::AccountDisabled)),
        }
    }
}

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            expires_at: Instant::now() + std::time::Duration::from_secs(CACHE_TTL_SECS),
        }
    }

    fn live(&self, now: Instant) -> Option<T> {
        (self.expires_at > now).then(|| self.value.clone())
    }
}

/// Module access cache shared across requests
#[derive(Clone, Default)]
pub struct ModuleCache {
    tenants: Arc<RwLock<HashMap<String, CacheEntry<TenantAccess>>>>,
    accounts: Arc<RwLock<HashMap<i64, CacheEntry<AccountAccess>>>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, company_id: &str) -> Option<TenantAccess> {
        let tenants = self.tenants.read().await;
        tenants
            .get(company_id)
            .and_then(|e| e.live(Instant::now()))
    }

    pub async fn put(&self, company_id: &str, access: TenantAccess) {
        self.tenants
            .write()
            .await
            .insert(company_id.to_string(), CacheEntry::new(access));
    }

    pub async fn invalidate(&self, company_id: &str) {
        self.tenants.write().await.remove(company_id);
    }

    /// Cached access, loading from the database on a miss
    pub async fn get_or_load(
        &self,
        pool: &PgPool,
        company_id: &str,
    ) -> Result<TenantAccess, ServiceError> {
        if let Some(access) = self.get(company_id).await {
            return Ok(access);
        }
        let access = load_access(pool, company_id).await?;
        self.put(company_id, access.clone()).await;
        Ok(access)
    }

    pub async fn get_account(&self, user_id: i64) -> Option<AccountAccess> {
        let accounts = self.accounts.read().await;
        accounts.get(&user_id).and_then(|e| e.live(Instant::now()))
    }

    pub async fn put_account(&self, user_id: i64, access: AccountAccess) {
        self.accounts
            .write()
            .await
            .insert(user_id, CacheEntry::new(access));
    }

    /// Drop a user's cached role/status after it was edited or deleted
    pub async fn invalidate_account(&self, user_id: i64) {
        self.accounts.write().await.remove(&user_id);
    }

    /// Re-read the caller's account; fails with `AccountDisabled` once it is
    /// deactivated or deleted.
    pub async fn refresh_user(
        &self,
        pool: &PgPool,
        claimed: &CurrentUser,
    ) -> Result<CurrentUser, ServiceError> {
        let access = match self.get_account(claimed.user_id).await {
            Some(access) => access,
            None => {
                let access = load_account(pool, claimed).await?;
                self.put_account(claimed.user_id, access).await;
                access
            }
        };
        Ok(access.apply(claimed)?)
    }

    /// Remove expired entries
    pub async fn prune(&self) {
        let now = Instant::now();
        self.tenants
            .write()
            .await
            .retain(|_, e| e.expires_at > now);
        self.accounts
            .write()
            .await
            .retain(|_, e| e.expires_at > now);
    }
}

async fn load_access(pool: &PgPool, company_id: &str) -> Result<TenantAccess, ServiceError> {
    let status = db::companies::find_status(pool, company_id)
        .await?
        .and_then(|s| CompanyStatus::from_db(&s))
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    let features = db::subscriptions::active_features(pool, company_id).await?;
    Ok(TenantAccess { status, features })
}

async fn load_account(pool: &PgPool, claimed: &CurrentUser) -> Result<AccountAccess, ServiceError> {
    let user = db::users::find_by_id(pool, &claimed.company_id, claimed.user_id).await?;
    Ok(match user {
        Some(u) if u.is_active => Role::from_db(&u.role)
            .map(AccountAccess::Live)
            .unwrap_or(AccountAccess::Disabled),
        _ => AccountAccess::Disabled,
    })
}

fn role_has_module(role: Role, module: Module) -> bool {
    modules::modules_for_role(role.as_db()).contains(&module)
}

/// Middleware factory: 403 unless `module` is enabled for the caller.
///
/// Must run AFTER `user_auth_middleware` (requires `CurrentUser`). Replaces
/// the request's `CurrentUser` with the account's stored role.
pub fn require_module(
    module: Module,
) -> impl Fn(State<AppState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<AppState>, mut req: Request, next: Next| {
        Box::pin(async move {
            let claimed = req
                .extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or_else(AppError::unauthorized)?;

            // Role table first: no database round trip needed to refuse
            if !role_has_module(claimed.role, module) {
                tracing::warn!(
                    user_id = claimed.user_id,
                    role = claimed.role.as_db(),
                    module = module.as_str(),
                    "Module denied by role"
                );
                return Err(module_denied(module, "role"));
            }

            let user = state.module_cache.refresh_user(&state.pool, &claimed).await?;
            if user.role != claimed.role && !role_has_module(user.role, module) {
                tracing::warn!(
                    user_id = user.user_id,
                    role = user.role.as_db(),
                    module = module.as_str(),
                    "Module denied by current role"
                );
                return Err(module_denied(module, "role"));
            }

            let access = state
                .module_cache
                .get_or_load(&state.pool, &user.company_id)
                .await?;

            if access.status == CompanyStatus::Canceled {
                return Err(AppError::new(ErrorCode::CompanyInactive));
            }

            if !modules::has_module(user.role.as_db(), access.plan_features(), module) {
                tracing::debug!(
                    company_id = %user.company_id,
                    module = module.as_str(),
                    "Module not in plan"
                );
                return Err(module_denied(module, "plan"));
            }

            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        })
    }
}

fn module_denied(module: Module, reason: &str) -> AppError {
    AppError::new(ErrorCode::ModuleNotEnabled)
        .with_detail("module", module.as_str())
        .with_detail("reason", reason)
}

fn role_denied(roles: &[Role]) -> AppError {
    let code = if matches!(roles, [Role::PlatformAdmin]) {
        ErrorCode::PlatformAdminRequired
    } else {
        ErrorCode::RoleRequired
    };
    AppError::new(code)
}

/// Middleware factory: 403 unless the caller has one of `roles`
///
/// Like [`require_module`], the stored account role decides once the token
/// role has passed.
pub fn require_role(
    roles: &'static [Role],
) -> impl Fn(State<AppState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<AppState>, mut req: Request, next: Next| {
        Box::pin(async move {
            let claimed = req
                .extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or_else(AppError::unauthorized)?;

            if !roles.contains(&claimed.role) {
                tracing::warn!(
                    user_id = claimed.user_id,
                    role = claimed.role.as_db(),
                    "Role check failed"
                );
                return Err(role_denied(roles));
            }

            let user = state.module_cache.refresh_user(&state.pool, &claimed).await?;
            if !roles.contains(&user.role) {
                tracing::warn!(
                    user_id = user.user_id,
                    role = user.role.as_db(),
                    "Role check failed for current role"
                );
                return Err(role_denied(roles));
            }

            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(status: CompanyStatus, features: Option<&[&str]>) -> TenantAccess {
        TenantAccess {
            status,
            features: features.map(|f| f.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_suspended_company_keeps_only_always_on() {
        let a = access(CompanyStatus::Suspended, Some(&["menu", "orders"]));
        assert!(a.plan_features().is_none());
        let mods = a.modules_for(Role::Owner);
        assert!(!mods.contains(&Module::Menu));
        assert!(mods.contains(&Module::Billing));
    }

    #[test]
    fn test_active_company_uses_plan() {
        let a = access(CompanyStatus::Active, Some(&["menu", "orders"]));
        let mods = a.modules_for(Role::Staff);
        assert!(mods.contains(&Module::Orders));
        assert!(!mods.contains(&Module::Menu));
    }

    fn claimed(role: Role) -> CurrentUser {
        CurrentUser {
            user_id: 7,
            company_id: "c1".into(),
            role,
            email: "a@example.com".into(),
        }
    }

    #[test]
    fn test_disabled_account_rejected() {
        let err = AccountAccess::Disabled.apply(&claimed(Role::Admin)).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);
        assert_eq!(err.http_status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_stored_role_replaces_token_role() {
        // admin demoted to staff after the token was issued
        let user = AccountAccess::Live(Role::Staff)
            .apply(&claimed(Role::Admin))
            .unwrap();
        assert_eq!(user.role, Role::Staff);
        assert_eq!(user.user_id, 7);
        assert_eq!(user.company_id, "c1");
        assert!(!role_has_module(user.role, Module::Users));
    }

    #[tokio::test]
    async fn test_account_cache_invalidate() {
        let cache = ModuleCache::new();
        assert!(cache.get_account(7).await.is_none());

        cache.put_account(7, AccountAccess::Live(Role::Admin)).await;
        assert_eq!(cache.get_account(7).await, Some(AccountAccess::Live(Role::Admin)));

        cache.invalidate_account(7).await;
        assert!(cache.get_account(7).await.is_none());
    }

    #[tokio::test]
    async fn test_prune_drops_expired_entries() {
        let cache = ModuleCache::new();
        let expired = Instant::now();
        cache.tenants.write().await.insert(
            "c1".into(),
            CacheEntry {
                value: access(CompanyStatus::Active, None),
                expires_at: expired,
            },
        );
        cache.accounts.write().await.insert(
            7,
            CacheEntry {
                value: AccountAccess::Disabled,
                expires_at: expired,
            },
        );
        cache.put("c2", access(CompanyStatus::Active, None)).await;

        cache.prune().await;

        assert_eq!(cache.tenants.read().await.len(), 1);
        assert!(cache.accounts.read().await.is_empty());
        assert!(cache.get("c2").await.is_some());
    }

    #[tokio::test]
    async fn test_cache_put_get_invalidate() {
        let cache = ModuleCache::new();
        assert!(cache.get("c1").await.is_none());

        let a = access(CompanyStatus::Active, None);
        cache.put("c1", a.clone()).await;
        assert_eq!(cache.get("c1").await, Some(a));

        cache.invalidate("c1").await;
        assert!(cache.get("c1").await.is_none());
    }
}
