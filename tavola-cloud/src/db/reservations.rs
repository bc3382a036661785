//! Reservation storage and the booking conflict check.
//!
//! Every write that can occupy a table (create, edit, confirm) runs in one
//! transaction that first locks the target `dining_tables` row with
//! `SELECT ... FOR UPDATE`. Two requests booking the same table therefore
//! serialise: the second sees the first's committed row when it loads the
//! existing bookings. Lock order is reservation row, then table row.

use chrono::{NaiveDate, NaiveTime};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BookedSlot, PageWindow, Reservation, ReservationCreate, ReservationFilter, ReservationStatus,
    ReservationUpdate, TimeSlot, find_conflict,
};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::{ServiceError, ServiceResult};

const COLUMNS: &str = "id, company_id, table_id, customer_name, customer_email, customer_phone, party_size,
    reservation_date, start_time, end_time, status, notes, created_at, updated_at";

/// Lock the table row and check it can seat `party_size`
async fn lock_table(
    conn: &mut PgConnection,
    company_id: &str,
    table_id: i64,
    party_size: i32,
) -> ServiceResult<()> {
    let row: Option<(i32, bool)> = sqlx::query_as(
        "SELECT capacity, is_active FROM dining_tables WHERE id = $1 AND company_id = $2 FOR UPDATE",
    )
    .bind(table_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;

    let (capacity, is_active) =
        row.ok_or_else(|| AppError::new(ErrorCode::TableNotFound).with_detail("table_id", table_id))?;
    if !is_active {
        return Err(AppError::new(ErrorCode::TableInactive)
            .with_detail("table_id", table_id)
            .into());
    }
    if party_size > capacity {
        return Err(AppError::new(ErrorCode::TableCapacityExceeded)
            .with_detail("capacity", capacity)
            .with_detail("party_size", party_size)
            .into());
    }
    Ok(())
}

/// Reject `slot` if it overlaps a confirmed booking of the same table/date
async fn ensure_no_conflict(
    conn: &mut PgConnection,
    table_id: i64,
    date: NaiveDate,
    slot: &TimeSlot,
    exclude_id: Option<i64>,
) -> ServiceResult<()> {
    let rows: Vec<(i64, String, NaiveTime, NaiveTime)> = sqlx::query_as(
        "SELECT id, status, start_time, end_time FROM reservations
         WHERE table_id = $1 AND reservation_date = $2 AND status = $3",
    )
    .bind(table_id)
    .bind(date)
    .bind(ReservationStatus::Confirmed.as_db())
    .fetch_all(&mut *conn)
    .await?;

    let booked: Vec<BookedSlot> = rows
        .into_iter()
        .filter_map(|(id, status, start, end)| {
            Some(BookedSlot {
                reservation_id: id,
                status: ReservationStatus::from_db(&status)?,
                slot: TimeSlot::new(start, end).ok()?,
            })
        })
        .collect();

    if let Some(hit) = find_conflict(slot, &booked, exclude_id) {
        tracing::info!(
            table_id,
            %date,
            conflicting_reservation_id = hit.reservation_id,
            "Reservation slot conflict"
        );
        return Err(AppError::new(ErrorCode::ReservationConflict)
            .with_detail("table_id", table_id)
            .with_detail("conflicting_reservation_id", hit.reservation_id)
            .with_detail("conflicting_start", hit.slot.start().to_string())
            .with_detail("conflicting_end", hit.slot.end().to_string())
            .into());
    }
    Ok(())
}

/// Create a reservation (dashboard or public storefront)
pub async fn create(
    pool: &PgPool,
    company_id: &str,
    data: &ReservationCreate,
    status: ReservationStatus,
) -> ServiceResult<Reservation> {
    let slot = TimeSlot::new(data.start_time, data.end_time)?;
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await?;
    lock_table(&mut tx, company_id, data.table_id, data.party_size).await?;
    ensure_no_conflict(&mut tx, data.table_id, data.reservation_date, &slot, None).await?;

    let reservation: Reservation = sqlx::query_as(&format!(
        "INSERT INTO reservations (id, company_id, table_id, customer_name, customer_email, customer_phone,
            party_size, reservation_date, start_time, end_time, status, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
         RETURNING {COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(data.table_id)
    .bind(&data.customer_name)
    .bind(&data.customer_email)
    .bind(&data.customer_phone)
    .bind(data.party_size)
    .bind(data.reservation_date)
    .bind(slot.start())
    .bind(slot.end())
    .bind(status.as_db())
    .bind(&data.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(reservation)
}

async fn lock_reservation(
    conn: &mut PgConnection,
    company_id: &str,
    id: i64,
) -> ServiceResult<Reservation> {
    let row: Option<Reservation> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = $1 AND company_id = $2 FOR UPDATE"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound))?)
}

fn parse_status(r: &Reservation) -> ServiceResult<ReservationStatus> {
    ReservationStatus::from_db(&r.status)
        .ok_or_else(|| ServiceError::Db(format!("Unknown reservation status '{}'", r.status).into()))
}

/// Edit a reservation; the new slot is re-checked, excluding itself
pub async fn update(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &ReservationUpdate,
) -> ServiceResult<Reservation> {
    let mut tx = pool.begin().await?;
    let current = lock_reservation(&mut tx, company_id, id).await?;
    let status = parse_status(&current)?;
    if status.is_terminal() {
        return Err(AppError::with_message(
            ErrorCode::ReservationInvalidTransition,
            "Reservation is closed and can no longer be edited",
        )
        .with_detail("status", status.as_db())
        .into());
    }

    let table_id = data.table_id.unwrap_or(current.table_id);
    let party_size = data.party_size.unwrap_or(current.party_size);
    let date = data.reservation_date.unwrap_or(current.reservation_date);
    let slot = TimeSlot::new(
        data.start_time.unwrap_or(current.start_time),
        data.end_time.unwrap_or(current.end_time),
    )?;

    lock_table(&mut tx, company_id, table_id, party_size).await?;
    ensure_no_conflict(&mut tx, table_id, date, &slot, Some(id)).await?;

    let reservation: Reservation = sqlx::query_as(&format!(
        "UPDATE reservations SET
            table_id = $3, party_size = $4, reservation_date = $5, start_time = $6, end_time = $7,
            customer_name = COALESCE($8, customer_name),
            customer_email = COALESCE($9, customer_email),
            customer_phone = COALESCE($10, customer_phone),
            notes = COALESCE($11, notes),
            updated_at = $12
         WHERE id = $1 AND company_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(table_id)
    .bind(party_size)
    .bind(date)
    .bind(slot.start())
    .bind(slot.end())
    .bind(&data.customer_name)
    .bind(&data.customer_email)
    .bind(&data.customer_phone)
    .bind(&data.notes)
    .bind(shared::util::now_millis())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(reservation)
}

/// Move a reservation through its lifecycle; confirming re-runs the conflict check
pub async fn set_status(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    next: ReservationStatus,
) -> ServiceResult<Reservation> {
    let mut tx = pool.begin().await?;
    let current = lock_reservation(&mut tx, company_id, id).await?;
    let status = parse_status(&current)?;

    if !status.can_transition_to(next) {
        return Err(AppError::new(ErrorCode::ReservationInvalidTransition)
            .with_detail("from", status.as_db())
            .with_detail("to", next.as_db())
            .into());
    }

    if next == ReservationStatus::Confirmed {
        let slot = TimeSlot::new(current.start_time, current.end_time)?;
        lock_table(&mut tx, company_id, current.table_id, current.party_size).await?;
        ensure_no_conflict(
            &mut tx,
            current.table_id,
            current.reservation_date,
            &slot,
            Some(id),
        )
        .await?;
    }

    let reservation: Reservation = sqlx::query_as(&format!(
        "UPDATE reservations SET status = $3, updated_at = $4
         WHERE id = $1 AND company_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(next.as_db())
    .bind(shared::util::now_millis())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(reservation)
}

pub async fn find_by_id(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<Reservation>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = $1 AND company_id = $2"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, company_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reservations WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, company_id: &str, f: &ReservationFilter) {
    qb.push(" WHERE company_id = ").push_bind(company_id.to_string());
    if let Some(date) = f.date {
        qb.push(" AND reservation_date = ").push_bind(date);
    }
    if let Some(from) = f.from {
        qb.push(" AND reservation_date >= ").push_bind(from);
    }
    if let Some(to) = f.to {
        qb.push(" AND reservation_date <= ").push_bind(to);
    }
    if let Some(status) = f.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(table_id) = f.table_id {
        qb.push(" AND table_id = ").push_bind(table_id);
    }
}

pub async fn list(
    pool: &PgPool,
    company_id: &str,
    filter: &ReservationFilter,
) -> Result<(Vec<Reservation>, i64, PageWindow), sqlx::Error> {
    let window = PageWindow::new(filter.page, filter.per_page);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reservations");
    push_filters(&mut count, company_id, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM reservations"));
    push_filters(&mut qb, company_id, filter);
    qb.push(" ORDER BY reservation_date, start_time LIMIT ")
        .push_bind(window.per_page)
        .push(" OFFSET ")
        .push_bind(window.offset());
    let rows = qb.build_query_as::<Reservation>().fetch_all(pool).await?;

    Ok((rows, total, window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_sql() {
        let filter = ReservationFilter {
            date: NaiveDate::from_ymd_opt(2026, 5, 1),
            status: Some(ReservationStatus::Confirmed),
            table_id: Some(7),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reservations");
        push_filters(&mut qb, "c1", &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM reservations WHERE company_id = $1 AND reservation_date = $2 AND status = $3 AND table_id = $4"
        );
    }

    #[test]
    fn test_filter_sql_company_only() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reservations");
        push_filters(&mut qb, "c1", &ReservationFilter::default());
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM reservations WHERE company_id = $1"
        );
    }
}
