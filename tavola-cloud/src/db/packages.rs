//! Pricing packages (platform-global)

use shared::models::{PricingPackage, PricingPackageCreate, PricingPackageUpdate};
use sqlx::PgPool;

const COLUMNS: &str = "id, name, description, monthly_price, yearly_price, currency, stripe_price_monthly, stripe_price_yearly, features, is_active, sort_order, created_at, updated_at";

pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<PricingPackage>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM pricing_packages
         WHERE ($1 = FALSE OR is_active)
         ORDER BY sort_order, monthly_price"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<PricingPackage>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM pricing_packages WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    id: i64,
    data: &PricingPackageCreate,
    features: &[String],
    now: i64,
) -> Result<PricingPackage, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO pricing_packages (id, name, description, monthly_price, yearly_price, currency,
            stripe_price_monthly, stripe_price_yearly, features, is_active, sort_order, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'usd'), $7, $8, $9, COALESCE($10, TRUE), COALESCE($11, 0), $12, $12)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.monthly_price)
    .bind(data.yearly_price)
    .bind(data.currency.as_deref().map(str::to_lowercase))
    .bind(&data.stripe_price_monthly)
    .bind(&data.stripe_price_yearly)
    .bind(features)
    .bind(data.is_active)
    .bind(data.sort_order)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &PricingPackageUpdate,
    features: Option<&[String]>,
    now: i64,
) -> Result<Option<PricingPackage>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE pricing_packages SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            monthly_price = COALESCE($4, monthly_price),
            yearly_price = COALESCE($5, yearly_price),
            currency = COALESCE($6, currency),
            stripe_price_monthly = COALESCE($7, stripe_price_monthly),
            stripe_price_yearly = COALESCE($8, stripe_price_yearly),
            features = COALESCE($9, features),
            is_active = COALESCE($10, is_active),
            sort_order = COALESCE($11, sort_order),
            updated_at = $12
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.monthly_price)
    .bind(data.yearly_price)
    .bind(data.currency.as_deref().map(str::to_lowercase))
    .bind(&data.stripe_price_monthly)
    .bind(&data.stripe_price_yearly)
    .bind(features)
    .bind(data.is_active)
    .bind(data.sort_order)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Hard delete; existing subscriptions keep their copied feature list
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pricing_packages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
