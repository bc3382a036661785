//! Testimonials

use shared::models::{Testimonial, TestimonialCreate, TestimonialUpdate};
use sqlx::PgPool;

const COLUMNS: &str =
    "id, author_name, author_title, content, rating, avatar_url, sort_order, is_published, created_at";

pub async fn list(
    pool: &PgPool,
    company_id: &str,
    published_only: bool,
) -> Result<Vec<Testimonial>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM testimonials
         WHERE company_id = $1 AND ($2 = FALSE OR is_published)
         ORDER BY sort_order, created_at DESC"
    ))
    .bind(company_id)
    .bind(published_only)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    company_id: &str,
    data: &TestimonialCreate,
    now: i64,
) -> Result<Testimonial, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO testimonials (id, company_id, author_name, author_title, content, rating, avatar_url,
            sort_order, is_published, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 0), COALESCE($9, TRUE), $10)
         RETURNING {COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(&data.author_name)
    .bind(&data.author_title)
    .bind(&data.content)
    .bind(data.rating)
    .bind(&data.avatar_url)
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
    data: &TestimonialUpdate,
) -> Result<Option<Testimonial>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE testimonials SET
            author_name = COALESCE($3, author_name),
            author_title = COALESCE($4, author_title),
            content = COALESCE($5, content),
            rating = COALESCE($6, rating),
            avatar_url = COALESCE($7, avatar_url),
            sort_order = COALESCE($8, sort_order),
            is_published = COALESCE($9, is_published)
         WHERE id = $1 AND company_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.author_name)
    .bind(&data.author_title)
    .bind(&data.content)
    .bind(data.rating)
    .bind(&data.avatar_url)
    .bind(data.sort_order)
    .bind(data.is_published)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, company_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM testimonials WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
