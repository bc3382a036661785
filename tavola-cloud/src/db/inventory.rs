//! Inventory items and stock adjustments

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    InventoryFilter, InventoryItem, InventoryItemCreate, InventoryItemUpdate, PageWindow,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{like_pattern, order_by};
use crate::error::ServiceResult;

const COLUMNS: &str = "id, name, sku, category, quantity, unit, reorder_level, unit_cost, supplier,
    created_at, updated_at";

const SORT_KEYS: &[(&str, &str)] = &[
    ("name", "name"),
    ("quantity", "quantity"),
    ("updated", "updated_at"),
    ("cost", "unit_cost"),
];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, company_id: &str, f: &InventoryFilter) {
    qb.push(" WHERE company_id = ")
        .push_bind(company_id.to_string())
        .push(" AND deleted_at IS NULL");
    if let Some(search) = f.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR supplier ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = f.category.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(supplier) = f.supplier.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND supplier = ").push_bind(supplier.to_string());
    }
    match f.low_stock {
        Some(true) => {
            qb.push(" AND quantity <= reorder_level");
        }
        Some(false) => {
            qb.push(" AND quantity > reorder_level");
        }
        None => {}
    }
}

pub async fn list(
    pool: &PgPool,
    company_id: &str,
    filter: &InventoryFilter,
) -> Result<(Vec<InventoryItem>, i64, PageWindow), sqlx::Error> {
    let window = PageWindow::new(filter.page, filter.per_page);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM inventory_items");
    push_filters(&mut count, company_id, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM inventory_items"));
    push_filters(&mut qb, company_id, filter);
    qb.push(" ORDER BY ")
        .push(order_by(filter.sort.as_deref(), SORT_KEYS))
        .push(", id LIMIT ")
        .push_bind(window.per_page)
        .push(" OFFSET ")
        .push_bind(window.offset());
    let items = qb.build_query_as::<InventoryItem>().fetch_all(pool).await?;

    Ok((items, total, window))
}

pub async fn find_by_id(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<InventoryItem>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM inventory_items WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    company_id: &str,
    data: &InventoryItemCreate,
    now: i64,
) -> Result<InventoryItem, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO inventory_items (id, company_id, name, sku, category, quantity, unit, reorder_level,
            unit_cost, supplier, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), $7, COALESCE($8, 0), $9, $10, $11, $11)
         RETURNING {COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(&data.name)
    .bind(&data.sku)
    .bind(&data.category)
    .bind(data.quantity)
    .bind(&data.unit)
    .bind(data.reorder_level)
    .bind(data.unit_cost)
    .bind(&data.supplier)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Edits metadata only; quantity moves through [`adjust`]
pub async fn update(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &InventoryItemUpdate,
    now: i64,
) -> Result<Option<InventoryItem>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE inventory_items SET
            name = COALESCE($3, name),
            sku = COALESCE($4, sku),
            category = COALESCE($5, category),
            unit = COALESCE($6, unit),
            reorder_level = COALESCE($7, reorder_level),
            unit_cost = COALESCE($8, unit_cost),
            supplier = COALESCE($9, supplier),
            updated_at = $10
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.name)
    .bind(&data.sku)
    .bind(&data.category)
    .bind(&data.unit)
    .bind(data.reorder_level)
    .bind(data.unit_cost)
    .bind(&data.supplier)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Apply a signed stock delta in one statement.
///
/// The guard `quantity + delta >= 0` lives in the UPDATE so concurrent
/// adjustments cannot drive stock negative.
pub async fn adjust(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    delta: Decimal,
    now: i64,
) -> ServiceResult<InventoryItem> {
    let updated: Option<InventoryItem> = sqlx::query_as(&format!(
        "UPDATE inventory_items SET quantity = quantity + $3, updated_at = $4
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL AND quantity + $3 >= 0
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(delta)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    if let Some(item) = updated {
        return Ok(item);
    }

    match find_by_id(pool, company_id, id).await? {
        Some(item) => Err(AppError::new(ErrorCode::InsufficientStock)
            .with_detail("quantity", item.quantity.to_string())
            .with_detail("delta", delta.to_string())
            .into()),
        None => Err(AppError::new(ErrorCode::InventoryItemNotFound).into()),
    }
}

pub async fn soft_delete(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE inventory_items SET deleted_at = $3, updated_at = $3
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(company_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(filter: &InventoryFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM inventory_items");
        push_filters(&mut qb, "c1", filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_no_filters() {
        assert_eq!(
            sql(&InventoryFilter::default()),
            "SELECT COUNT(*) FROM inventory_items WHERE company_id = $1 AND deleted_at IS NULL"
        );
    }

    #[test]
    fn test_search_spans_name_sku_supplier() {
        let filter = InventoryFilter {
            search: Some("oil".into()),
            low_stock: Some(true),
            ..Default::default()
        };
        assert_eq!(
            sql(&filter),
            "SELECT COUNT(*) FROM inventory_items WHERE company_id = $1 AND deleted_at IS NULL \
             AND (name ILIKE $2 OR sku ILIKE $3 OR supplier ILIKE $4) AND quantity <= reorder_level"
        );
    }

    #[test]
    fn test_category_and_supplier() {
        let filter = InventoryFilter {
            category: Some("dry goods".into()),
            supplier: Some("Metro".into()),
            low_stock: Some(false),
            ..Default::default()
        };
        assert_eq!(
            sql(&filter),
            "SELECT COUNT(*) FROM inventory_items WHERE company_id = $1 AND deleted_at IS NULL \
             AND category = $2 AND supplier = $3 AND quantity > reorder_level"
        );
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(order_by(Some("-quantity"), SORT_KEYS), "quantity DESC");
        assert_eq!(order_by(Some("cost"), SORT_KEYS), "unit_cost ASC");
        assert_eq!(order_by(None, SORT_KEYS), "name ASC");
    }
}
