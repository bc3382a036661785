//! Company user queries

use shared::models::User;
use sqlx::PgPool;

const COLUMNS: &str = "id, company_id, email, name, password_hash, role, is_active, last_login_at, created_at, updated_at";

pub struct NewUser<'a> {
    pub id: i64,
    pub company_id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub now: i64,
}

/// Partial update; `None` keeps the stored value
#[derive(Default)]
pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub role: Option<&'a str>,
    pub is_active: Option<bool>,
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM users WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, company_id: &str) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM users WHERE company_id = $1 AND deleted_at IS NULL ORDER BY created_at"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, u: &NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO users (id, company_id, email, name, password_hash, role, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
         RETURNING {COLUMNS}"
    ))
    .bind(u.id)
    .bind(u.company_id)
    .bind(u.email)
    .bind(u.name)
    .bind(u.password_hash)
    .bind(u.role)
    .bind(u.now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    changes: &UserChanges<'_>,
    now: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE users SET
            name = COALESCE($3, name),
            password_hash = COALESCE($4, password_hash),
            role = COALESCE($5, role),
            is_active = COALESCE($6, is_active),
            updated_at = $7
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(changes.name)
    .bind(changes.password_hash)
    .bind(changes.role)
    .bind(changes.is_active)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Soft delete; the email stays reserved
pub async fn soft_delete(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET deleted_at = $3, is_active = FALSE, updated_at = $3
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(company_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn touch_login(pool: &PgPool, id: i64, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
