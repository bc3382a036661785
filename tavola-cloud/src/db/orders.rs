//! Orders and order lines
//!
//! Prices are never taken from the client: each line is priced from the live
//! menu item inside the creating transaction and the order total is the sum
//! of the rounded line totals.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Order, OrderCreate, OrderDetail, OrderFilter, OrderLine, OrderLineInput, OrderStatus,
    OrderType, PageWindow, line_total,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::{ServiceError, ServiceResult};

const COLUMNS: &str = "id, order_type, status, table_id, customer_name, customer_email, customer_phone,
    delivery_address, notes, total, created_at, updated_at";
const LINE_COLUMNS: &str = "id, order_id, menu_item_id, name, unit_price, quantity, line_total, notes";

/// Live menu data used to price a line
#[derive(Debug, Clone, sqlx::FromRow)]
struct PricedItem {
    id: i64,
    name: String,
    price: Decimal,
    is_available: bool,
}

/// Price every input line; fails on the first missing or unavailable item
fn price_lines(
    order_id: i64,
    inputs: &[OrderLineInput],
    menu: &HashMap<i64, PricedItem>,
) -> Result<(Vec<OrderLine>, Decimal), AppError> {
    let mut lines = Vec::with_capacity(inputs.len());
    let mut total = Decimal::ZERO;
    for input in inputs {
        let item = menu
            .get(&input.menu_item_id)
            .filter(|m| m.is_available)
            .ok_or_else(|| {
                AppError::new(ErrorCode::MenuItemUnavailable)
                    .with_detail("menu_item_id", input.menu_item_id)
            })?;
        let amount = line_total(item.price, input.quantity);
        total += amount;
        lines.push(OrderLine {
            id: shared::util::snowflake_id(),
            order_id,
            menu_item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity: input.quantity,
            line_total: amount,
            notes: input.notes.clone(),
        });
    }
    Ok((lines, total))
}

fn check_order_type(data: &OrderCreate) -> Result<(), AppError> {
    match data.order_type {
        OrderType::DineIn if data.table_id.is_none() => {
            Err(AppError::validation("Dine-in orders need a table").with_detail("table_id", "required"))
        }
        OrderType::Delivery if data.delivery_address.as_deref().is_none_or(str::is_empty) => {
            Err(AppError::validation("Delivery orders need an address")
                .with_detail("delivery_address", "required"))
        }
        _ => Ok(()),
    }
}

pub async fn create(pool: &PgPool, company_id: &str, data: &OrderCreate) -> ServiceResult<OrderDetail> {
    if data.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }
    check_order_type(data)?;

    let now = shared::util::now_millis();
    let order_id = shared::util::snowflake_id();
    let mut tx = pool.begin().await?;

    if let Some(table_id) = data.table_id {
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM dining_tables WHERE id = $1 AND company_id = $2")
                .bind(table_id)
                .bind(company_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::new(ErrorCode::TableNotFound)
                .with_detail("table_id", table_id)
                .into());
        }
    }

    let ids: Vec<i64> = data.items.iter().map(|l| l.menu_item_id).collect();
    let menu: HashMap<i64, PricedItem> = sqlx::query_as::<_, PricedItem>(
        "SELECT id, name, price, is_available FROM menu_items
         WHERE company_id = $1 AND id = ANY($2) AND deleted_at IS NULL",
    )
    .bind(company_id)
    .bind(&ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|m| (m.id, m))
    .collect();

    let (lines, total) = price_lines(order_id, &data.items, &menu)?;

    let order: Order = sqlx::query_as(&format!(
        "INSERT INTO orders (id, company_id, order_type, status, table_id, customer_name, customer_email,
            customer_phone, delivery_address, notes, total, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
         RETURNING {COLUMNS}"
    ))
    .bind(order_id)
    .bind(company_id)
    .bind(data.order_type.as_db())
    .bind(OrderStatus::Pending.as_db())
    .bind(data.table_id)
    .bind(&data.customer_name)
    .bind(&data.customer_email)
    .bind(&data.customer_phone)
    .bind(&data.delivery_address)
    .bind(&data.notes)
    .bind(total)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for line in &lines {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, menu_item_id, name, unit_price, quantity, line_total, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(line.id)
        .bind(line.order_id)
        .bind(line.menu_item_id)
        .bind(&line.name)
        .bind(line.unit_price)
        .bind(line.quantity)
        .bind(line.line_total)
        .bind(&line.notes)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(order_id, company_id, %total, lines = lines.len(), "Order created");
    Ok(OrderDetail { order, items: lines })
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, company_id: &str, f: &OrderFilter) {
    qb.push(" WHERE company_id = ").push_bind(company_id.to_string());
    if let Some(status) = f.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(order_type) = f.order_type {
        qb.push(" AND order_type = ").push_bind(order_type.as_db());
    }
    if let Some(from) = f.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = f.to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

pub async fn list(
    pool: &PgPool,
    company_id: &str,
    filter: &OrderFilter,
) -> Result<(Vec<Order>, i64, PageWindow), sqlx::Error> {
    let window = PageWindow::new(filter.page, filter.per_page);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
    push_filters(&mut count, company_id, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM orders"));
    push_filters(&mut qb, company_id, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(window.per_page)
        .push(" OFFSET ")
        .push_bind(window.offset());
    let orders = qb.build_query_as::<Order>().fetch_all(pool).await?;

    Ok((orders, total, window))
}

pub async fn find_detail(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<OrderDetail>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM orders WHERE id = $1 AND company_id = $2"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await?;
    let Some(order) = order else {
        return Ok(None);
    };

    let items: Vec<OrderLine> = sqlx::query_as(&format!(
        "SELECT {LINE_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(OrderDetail { order, items }))
}

/// Move an order along its status machine
pub async fn set_status(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    next: OrderStatus,
) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;

    let current: Option<(String,)> =
        sqlx::query_as("SELECT status FROM orders WHERE id = $1 AND company_id = $2 FOR UPDATE")
            .bind(id)
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (raw,) = current.ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let current = OrderStatus::from_db(&raw)
        .ok_or_else(|| ServiceError::Db(format!("Unknown order status '{raw}'").into()))?;

    if !current.can_transition_to(next) {
        return Err(AppError::new(ErrorCode::OrderInvalidTransition)
            .with_detail("from", current.as_db())
            .with_detail("to", next.as_db())
            .into());
    }

    let order: Order = sqlx::query_as(&format!(
        "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(next.as_db())
    .bind(shared::util::now_millis())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn menu() -> HashMap<i64, PricedItem> {
        [
            (1, "Margherita", "9.50", true),
            (2, "Tiramisu", "6.25", true),
            (3, "Special", "20.00", false),
        ]
        .into_iter()
        .map(|(id, name, price, is_available)| {
            (
                id,
                PricedItem {
                    id,
                    name: name.to_string(),
                    price: Decimal::from_str(price).unwrap(),
                    is_available,
                },
            )
        })
        .collect()
    }

    fn line(menu_item_id: i64, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            menu_item_id,
            quantity,
            notes: None,
        }
    }

    #[test]
    fn test_price_lines_uses_menu_prices() {
        let (lines, total) = price_lines(7, &[line(1, 2), line(2, 1)], &menu()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Margherita");
        assert_eq!(lines[0].line_total, Decimal::from_str("19.00").unwrap());
        assert!(lines.iter().all(|l| l.order_id == 7));
        assert_eq!(total, Decimal::from_str("25.25").unwrap());
    }

    #[test]
    fn test_price_lines_rejects_unavailable_and_unknown() {
        let err = price_lines(7, &[line(1, 1), line(3, 1)], &menu()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemUnavailable);
        assert_eq!(err.details.unwrap()["menu_item_id"], 3);

        let err = price_lines(7, &[line(42, 1)], &menu()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemUnavailable);
    }

    #[test]
    fn test_order_type_requirements() {
        let base: OrderCreate = serde_json::from_value(serde_json::json!({
            "order_type": "dine_in",
            "items": [{ "menu_item_id": 1, "quantity": 1 }]
        }))
        .unwrap();
        assert_eq!(check_order_type(&base).unwrap_err().code, ErrorCode::ValidationFailed);

        let delivery = OrderCreate {
            order_type: OrderType::Delivery,
            delivery_address: Some("Via Roma 1".into()),
            ..base.clone()
        };
        assert!(check_order_type(&delivery).is_ok());

        let takeout = OrderCreate {
            order_type: OrderType::Takeout,
            ..base
        };
        assert!(check_order_type(&takeout).is_ok());
    }

    #[test]
    fn test_filter_sql() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Ready),
            from: Some(1_000),
            to: Some(2_000),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut qb, "c1", &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM orders WHERE company_id = $1 AND status = $2 \
             AND created_at >= $3 AND created_at < $4"
        );
    }
}
