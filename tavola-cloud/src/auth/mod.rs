//! Authentication and authorization middleware

pub mod module_access;
pub mod rate_limit;
pub mod user_auth;

pub use module_access::{ModuleCache, TenantAccess, require_module, require_role};
pub use rate_limit::RateLimiter;
pub use user_auth::{CurrentUser, user_auth_middleware};
