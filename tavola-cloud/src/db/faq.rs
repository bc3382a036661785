//! FAQ entries

use shared::models::{FaqItem, FaqItemCreate, FaqItemUpdate};
use sqlx::PgPool;

const COLUMNS: &str = "id, question, answer, category, sort_order, is_published, created_at, updated_at";

/// `published_only` selects the storefront view
pub async fn list(
    pool: &PgPool,
    company_id: &str,
    published_only: bool,
) -> Result<Vec<FaqItem>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM faq_items
         WHERE company_id = $1 AND ($2 = FALSE OR is_published)
         ORDER BY category NULLS FIRST, sort_order, id"
    ))
    .bind(company_id)
    .bind(published_only)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    company_id: &str,
    data: &FaqItemCreate,
    now: i64,
) -> Result<FaqItem, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO faq_items (id, company_id, question, answer, category, sort_order, is_published,
            created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), COALESCE($7, TRUE), $8, $8)
         RETURNING {COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(&data.question)
    .bind(&data.answer)
    .bind(&data.category)
    .bind(data.sort_order)
    .bind(data.is_published)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &FaqItemUpdate,
    now: i64,
) -> Result<Option<FaqItem>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE faq_items SET
            question = COALESCE($3, question),
            answer = COALESCE($4, answer),
            category = COALESCE($5, category),
            sort_order = COALESCE($6, sort_order),
            is_published = COALESCE($7, is_published),
            updated_at = $8
         WHERE id = $1 AND company_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.question)
    .bind(&data.answer)
    .bind(&data.category)
    .bind(data.sort_order)
    .bind(data.is_published)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, company_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM faq_items WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
