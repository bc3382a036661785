//! Company (tenant) queries

use shared::models::{Company, CompanyUpdate};
use sqlx::PgPool;

const COLUMNS: &str = "id, name, slug, email, phone, address, status, stripe_customer_id, created_at, updated_at";

/// Company + owner account created together at registration
pub struct NewCompany<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub slug: &'a str,
    pub email: &'a str,
    pub owner_id: i64,
    pub owner_name: &'a str,
    pub owner_password_hash: &'a str,
    pub now: i64,
}

pub async fn create_with_owner(pool: &PgPool, c: &NewCompany<'_>) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO companies (id, name, slug, email, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, 'active', $5, $5)",
    )
    .bind(c.id)
    .bind(c.name)
    .bind(c.slug)
    .bind(c.email)
    .bind(c.now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO users (id, company_id, email, name, password_hash, role, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, 'owner', TRUE, $6, $6)",
    )
    .bind(c.owner_id)
    .bind(c.id)
    .bind(c.email)
    .bind(c.owner_name)
    .bind(c.owner_password_hash)
    .bind(c.now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM companies WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM companies WHERE slug = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_stripe_customer(
    pool: &PgPool,
    customer_id: &str,
) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM companies WHERE stripe_customer_id = $1"
    ))
    .bind(customer_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_status(pool: &PgPool, id: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT status FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.0))
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM companies WHERE slug = $1)")
            .bind(slug)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

pub async fn update(
    pool: &PgPool,
    id: &str,
    data: &CompanyUpdate,
    now: i64,
) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE companies SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone),
            address = COALESCE($5, address),
            updated_at = $6
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&data.name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.address)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn update_status(pool: &PgPool, id: &str, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE companies SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Store `stripe_customer_id` unless the company already has one.
///
/// Returns the id in force afterwards (`None` if the company is gone). The
/// row lock taken by the UPDATE makes a second caller see the first value.
pub async fn claim_stripe_customer(
    pool: &PgPool,
    id: &str,
    stripe_customer_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> = sqlx::query_as(
        "UPDATE companies SET stripe_customer_id = COALESCE(stripe_customer_id, $1)
         WHERE id = $2
         RETURNING stripe_customer_id",
    )
    .bind(stripe_customer_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.and_then(|(cid,)| cid))
}
