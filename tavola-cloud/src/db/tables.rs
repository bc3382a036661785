//! Dining table queries

use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};
use sqlx::PgPool;

const COLUMNS: &str = "id, name, capacity, area, is_active";

pub async fn list(pool: &PgPool, company_id: &str) -> Result<Vec<DiningTable>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM dining_tables WHERE company_id = $1 ORDER BY area NULLS FIRST, name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<DiningTable>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM dining_tables WHERE id = $1 AND company_id = $2"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &DiningTableCreate,
    now: i64,
) -> Result<DiningTable, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO dining_tables (id, company_id, name, capacity, area, is_active, created_at)
         VALUES ($1, $2, $3, COALESCE($4, 4), $5, TRUE, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.name)
    .bind(data.capacity)
    .bind(&data.area)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &DiningTableUpdate,
) -> Result<Option<DiningTable>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE dining_tables SET
            name = COALESCE($3, name),
            capacity = COALESCE($4, capacity),
            area = COALESCE($5, area),
            is_active = COALESCE($6, is_active)
         WHERE id = $1 AND company_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.name)
    .bind(data.capacity)
    .bind(&data.area)
    .bind(data.is_active)
    .fetch_optional(pool)
    .await
}

/// Hard delete; tables referenced by reservations or orders fail with a
/// foreign-key violation (deactivate them instead).
pub async fn delete(pool: &PgPool, company_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM dining_tables WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
