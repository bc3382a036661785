//! Application state

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{ModuleCache, RateLimiter};
use crate::config::Config;
use crate::stripe::StripeClient;
use crate::theme::ThemeCache;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Stripe REST client
    pub stripe: StripeClient,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Dashboard base URL (checkout/portal redirects)
    pub app_base_url: String,
    /// Rate limiter for login/registration/public submission routes
    pub rate_limiter: RateLimiter,
    /// Company status + plan features cache
    pub module_cache: ModuleCache,
    /// Storefront theme cache
    pub theme_cache: ThemeCache,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self::with_pool(config, pool))
    }

    /// Build state around an existing pool (no migrations)
    pub fn with_pool(config: &Config, pool: PgPool) -> Self {
        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            stripe: StripeClient::new(config.stripe_secret_key.clone()),
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            app_base_url: config.app_base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(),
            module_cache: ModuleCache::new(),
            theme_cache: ThemeCache::new(),
        }
    }
}
