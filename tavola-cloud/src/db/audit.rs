//! Audit log operations

use serde::Serialize;
use shared::models::PageWindow;
use sqlx::PgPool;

/// Write an audit log entry.
///
/// Failures are logged and swallowed: auditing never fails the request.
pub async fn log(
    pool: &PgPool,
    company_id: &str,
    user_id: Option<i64>,
    action: &str,
    detail: Option<serde_json::Value>,
) {
    let result = sqlx::query(
        "INSERT INTO audit_logs (company_id, user_id, action, detail, created_at) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(company_id)
    .bind(user_id)
    .bind(action)
    .bind(detail)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(company_id, action, error = %e, "Failed to write audit log");
    }
}

#[derive(sqlx::FromRow, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: i64,
}

pub async fn query(
    pool: &PgPool,
    company_id: &str,
    window: PageWindow,
) -> Result<(Vec<AuditEntry>, i64), sqlx::Error> {
    let rows: Vec<AuditEntry> = sqlx::query_as(
        "SELECT id, user_id, action, detail, ip_address, created_at FROM audit_logs
         WHERE company_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(company_id)
    .bind(window.per_page)
    .bind(window.offset())
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE company_id = $1")
        .bind(company_id)
        .fetch_one(pool)
        .await?;
    Ok((rows, total))
}
