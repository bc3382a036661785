//! Storefront contact-form inbox

use shared::models::{ContactFilter, ContactSubmission, ContactSubmissionCreate, PageWindow};
use sqlx::PgPool;

const COLUMNS: &str = "id, name, email, phone, subject, message, is_read, created_at";

pub async fn create(
    pool: &PgPool,
    company_id: &str,
    data: &ContactSubmissionCreate,
    now: i64,
) -> Result<ContactSubmission, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO contact_submissions (id, company_id, name, email, phone, subject, message, is_read, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8)
         RETURNING {COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(data.name.trim())
    .bind(shared::util::normalize_email(&data.email))
    .bind(&data.phone)
    .bind(&data.subject)
    .bind(&data.message)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Newest first; `unread = true` limits to unread submissions
pub async fn list(
    pool: &PgPool,
    company_id: &str,
    filter: &ContactFilter,
) -> Result<(Vec<ContactSubmission>, i64, PageWindow), sqlx::Error> {
    let window = PageWindow::new(filter.page, filter.per_page);
    let unread_only = filter.unread.unwrap_or(false);

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM contact_submissions WHERE company_id = $1 AND ($2 = FALSE OR NOT is_read)",
    )
    .bind(company_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM contact_submissions
         WHERE company_id = $1 AND ($2 = FALSE OR NOT is_read)
         ORDER BY created_at DESC, id DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(company_id)
    .bind(unread_only)
    .bind(window.per_page)
    .bind(window.offset())
    .fetch_all(pool)
    .await?;

    Ok((items, total, window))
}

pub async fn mark_read(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<ContactSubmission>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE contact_submissions SET is_read = TRUE WHERE id = $1 AND company_id = $2 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, company_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contact_submissions WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
