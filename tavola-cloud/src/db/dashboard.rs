use chrono::NaiveDate;
use shared::models::DashboardStats;
use sqlx::PgPool;

/// Headline counters for the dashboard landing page
pub async fn stats(pool: &PgPool, company_id: &str, today: NaiveDate) -> Result<DashboardStats, sqlx::Error> {
    let (reservations_today, open_orders, low_stock_items, open_tickets, unread_contacts): (
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM reservations
              WHERE company_id = $1 AND reservation_date = $2 AND status IN ('pending', 'confirmed')),
            (SELECT COUNT(*) FROM orders
              WHERE company_id = $1 AND status IN ('pending', 'preparing', 'ready')),
            (SELECT COUNT(*) FROM inventory_items
              WHERE company_id = $1 AND deleted_at IS NULL AND quantity <= reorder_level),
            (SELECT COUNT(*) FROM support_tickets
              WHERE company_id = $1 AND status IN ('open', 'in_progress')),
            (SELECT COUNT(*) FROM contact_submissions
              WHERE company_id = $1 AND NOT is_read)",
    )
    .bind(company_id)
    .bind(today)
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        reservations_today,
        open_orders,
        low_stock_items,
        open_tickets,
        unread_contacts,
    })
}
