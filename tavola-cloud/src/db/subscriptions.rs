//! Local mirror of Stripe subscriptions

use shared::models::{Subscription, SubscriptionStatus};
use sqlx::PgPool;

const COLUMNS: &str = "id, company_id, package_id, status, billing_interval, features, current_period_end, cancel_at_period_end, created_at, updated_at";

pub struct UpsertSubscription<'a> {
    pub id: &'a str,
    pub company_id: &'a str,
    pub package_id: Option<i64>,
    pub status: &'a str,
    pub billing_interval: &'a str,
    pub features: &'a [String],
    pub current_period_end: Option<i64>,
    pub now: i64,
}

pub async fn upsert(pool: &PgPool, sub: &UpsertSubscription<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscriptions (id, company_id, package_id, status, billing_interval, features, current_period_end, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
         ON CONFLICT (id) DO UPDATE SET
            package_id = EXCLUDED.package_id, status = EXCLUDED.status,
            billing_interval = EXCLUDED.billing_interval, features = EXCLUDED.features,
            current_period_end = COALESCE(EXCLUDED.current_period_end, subscriptions.current_period_end),
            updated_at = EXCLUDED.updated_at",
    )
    .bind(sub.id)
    .bind(sub.company_id)
    .bind(sub.package_id)
    .bind(sub.status)
    .bind(sub.billing_interval)
    .bind(sub.features)
    .bind(sub.current_period_end)
    .bind(sub.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_status(
    pool: &PgPool,
    subscription_id: &str,
    status: &str,
    cancel_at_period_end: Option<bool>,
    current_period_end: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE subscriptions SET
            status = $1,
            cancel_at_period_end = COALESCE($2, cancel_at_period_end),
            current_period_end = COALESCE($3, current_period_end),
            updated_at = $4
         WHERE id = $5",
    )
    .bind(status)
    .bind(cancel_at_period_end)
    .bind(current_period_end)
    .bind(shared::util::now_millis())
    .bind(subscription_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_period_end(
    pool: &PgPool,
    subscription_id: &str,
    period_end: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE subscriptions SET current_period_end = $1, updated_at = $2 WHERE id = $3")
        .bind(period_end)
        .bind(shared::util::now_millis())
        .bind(subscription_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_company_by_sub_id(
    pool: &PgPool,
    stripe_sub_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT company_id FROM subscriptions WHERE id = $1")
            .bind(stripe_sub_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|r| r.0))
}

/// Most recent subscription of a company, whatever its status
pub async fn latest(pool: &PgPool, company_id: &str) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM subscriptions WHERE company_id = $1 ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

/// Feature list of the subscription currently granting access, if any
pub async fn active_features(
    pool: &PgPool,
    company_id: &str,
) -> Result<Option<Vec<String>>, sqlx::Error> {
    let granting: Vec<&str> = [SubscriptionStatus::Active, SubscriptionStatus::Trialing]
        .iter()
        .map(|s| s.as_db())
        .collect();
    let row: Option<(Vec<String>,)> = sqlx::query_as(
        "SELECT features FROM subscriptions
         WHERE company_id = $1 AND status = ANY($2)
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(company_id)
    .bind(&granting)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}
