//! Support tickets and their message threads
//!
//! Tenants see their own company's tickets; platform admins pass
//! `scope = None` and see every ticket.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    PageWindow, SupportTicket, TicketCreate, TicketDetail, TicketFilter, TicketMessage,
    TicketPriority, TicketStatus,
};
use sqlx::{PgConnection, PgPool};

use crate::error::{ServiceError, ServiceResult};

const COLUMNS: &str = "id, company_id, created_by, subject, status, priority, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, ticket_id, author_id, is_staff_reply, body, created_at";

pub async fn create(
    pool: &PgPool,
    company_id: &str,
    user_id: i64,
    data: &TicketCreate,
) -> ServiceResult<TicketDetail> {
    let now = shared::util::now_millis();
    let ticket_id = shared::util::snowflake_id();
    let priority = data.priority.unwrap_or(TicketPriority::Normal);

    let mut tx = pool.begin().await?;
    let ticket: SupportTicket = sqlx::query_as(&format!(
        "INSERT INTO support_tickets (id, company_id, created_by, subject, status, priority, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
         RETURNING {COLUMNS}"
    ))
    .bind(ticket_id)
    .bind(company_id)
    .bind(user_id)
    .bind(data.subject.trim())
    .bind(TicketStatus::Open.as_db())
    .bind(priority.as_db())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let message = insert_message(&mut tx, ticket_id, user_id, false, &data.body, now).await?;
    tx.commit().await?;

    tracing::info!(ticket_id, company_id, priority = priority.as_db(), "Support ticket opened");
    Ok(TicketDetail {
        ticket,
        messages: vec![message],
    })
}

async fn insert_message(
    conn: &mut PgConnection,
    ticket_id: i64,
    author_id: i64,
    is_staff_reply: bool,
    body: &str,
    now: i64,
) -> Result<TicketMessage, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO ticket_messages (id, ticket_id, author_id, is_staff_reply, body, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(ticket_id)
    .bind(author_id)
    .bind(is_staff_reply)
    .bind(body)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn list(
    pool: &PgPool,
    scope: Option<&str>,
    filter: &TicketFilter,
) -> Result<(Vec<SupportTicket>, i64, PageWindow), sqlx::Error> {
    let window = PageWindow::new(filter.page, filter.per_page);
    let status = filter.status.map(|s| s.as_db());

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM support_tickets
         WHERE ($1::TEXT IS NULL OR company_id = $1) AND ($2::TEXT IS NULL OR status = $2)",
    )
    .bind(scope)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let tickets = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM support_tickets
         WHERE ($1::TEXT IS NULL OR company_id = $1) AND ($2::TEXT IS NULL OR status = $2)
         ORDER BY updated_at DESC, id DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(scope)
    .bind(status)
    .bind(window.per_page)
    .bind(window.offset())
    .fetch_all(pool)
    .await?;

    Ok((tickets, total, window))
}

pub async fn find_detail(
    pool: &PgPool,
    scope: Option<&str>,
    id: i64,
) -> Result<Option<TicketDetail>, sqlx::Error> {
    let ticket: Option<SupportTicket> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM support_tickets WHERE id = $1 AND ($2::TEXT IS NULL OR company_id = $2)"
    ))
    .bind(id)
    .bind(scope)
    .fetch_optional(pool)
    .await?;
    let Some(ticket) = ticket else {
        return Ok(None);
    };

    let messages = sqlx::query_as(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM ticket_messages WHERE ticket_id = $1 ORDER BY created_at, id"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(TicketDetail { ticket, messages }))
}

async fn lock_status(
    conn: &mut PgConnection,
    scope: Option<&str>,
    id: i64,
) -> ServiceResult<TicketStatus> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT status FROM support_tickets WHERE id = $1 AND ($2::TEXT IS NULL OR company_id = $2) FOR UPDATE",
    )
    .bind(id)
    .bind(scope)
    .fetch_optional(&mut *conn)
    .await?;
    let (raw,) = row.ok_or_else(|| AppError::new(ErrorCode::TicketNotFound))?;
    TicketStatus::from_db(&raw)
        .ok_or_else(|| ServiceError::Db(format!("Unknown ticket status '{raw}'").into()))
}

/// Status after a new message: a customer reply reopens a resolved ticket
fn status_after_reply(current: TicketStatus, is_staff_reply: bool) -> TicketStatus {
    match (current, is_staff_reply) {
        (TicketStatus::Resolved, false) => TicketStatus::Open,
        (status, _) => status,
    }
}

/// Append a message; closed tickets accept no further messages
pub async fn add_message(
    pool: &PgPool,
    scope: Option<&str>,
    ticket_id: i64,
    author_id: i64,
    is_staff_reply: bool,
    body: &str,
) -> ServiceResult<TicketMessage> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let current = lock_status(&mut tx, scope, ticket_id).await?;
    if current == TicketStatus::Closed {
        return Err(AppError::new(ErrorCode::TicketClosed)
            .with_detail("ticket_id", ticket_id)
            .into());
    }

    let message = insert_message(&mut tx, ticket_id, author_id, is_staff_reply, body, now).await?;
    sqlx::query("UPDATE support_tickets SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(ticket_id)
        .bind(status_after_reply(current, is_staff_reply).as_db())
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(message)
}

pub async fn set_status(
    pool: &PgPool,
    scope: Option<&str>,
    id: i64,
    next: TicketStatus,
) -> ServiceResult<SupportTicket> {
    let mut tx = pool.begin().await?;

    let current = lock_status(&mut tx, scope, id).await?;
    if !current.can_transition_to(next) {
        return Err(AppError::new(ErrorCode::TicketInvalidTransition)
            .with_detail("from", current.as_db())
            .with_detail("to", next.as_db())
            .into());
    }

    let ticket = sqlx::query_as(&format!(
        "UPDATE support_tickets SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(next.as_db())
    .bind(shared::util::now_millis())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_reply_reopens_resolved() {
        assert_eq!(status_after_reply(TicketStatus::Resolved, false), TicketStatus::Open);
        assert_eq!(status_after_reply(TicketStatus::Resolved, true), TicketStatus::Resolved);
        assert_eq!(
            status_after_reply(TicketStatus::InProgress, false),
            TicketStatus::InProgress
        );
    }
}
