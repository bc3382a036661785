//! Menu categories and items

use shared::error::{AppError, ErrorCode};
use shared::models::{
    MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, MenuItem, MenuItemCreate,
    MenuItemFilter, MenuItemUpdate, MenuSection, PageWindow,
};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::{like_pattern, order_by};
use crate::error::ServiceResult;

const CATEGORY_COLUMNS: &str = "id, name, description, sort_order, is_active, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, category_id, name, description, price, image_url, is_available, is_featured,
    dietary_tags, sort_order, created_at, updated_at";

/// `sort` keys accepted by the item list
const ITEM_SORT_KEYS: &[(&str, &str)] = &[
    ("sort_order", "sort_order"),
    ("name", "name"),
    ("price", "price"),
    ("created", "created_at"),
];

// ── Categories ──

pub async fn list_categories(
    pool: &PgPool,
    company_id: &str,
) -> Result<Vec<MenuCategory>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM menu_categories
         WHERE company_id = $1 AND deleted_at IS NULL
         ORDER BY sort_order, name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn create_category(
    pool: &PgPool,
    company_id: &str,
    data: &MenuCategoryCreate,
    now: i64,
) -> Result<MenuCategory, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO menu_categories (id, company_id, name, description, sort_order, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, COALESCE($5, 0), TRUE, $6, $6)
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.sort_order)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update_category(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &MenuCategoryUpdate,
    now: i64,
) -> Result<Option<MenuCategory>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE menu_categories SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            sort_order = COALESCE($5, sort_order),
            is_active = COALESCE($6, is_active),
            updated_at = $7
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Soft delete; refused while the category still has live items
pub async fn delete_category(pool: &PgPool, company_id: &str, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let locked: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM menu_categories WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .bind(company_id)
    .fetch_optional(&mut *tx)
    .await?;
    if locked.is_none() {
        return Err(AppError::new(ErrorCode::CategoryNotFound).into());
    }

    let (items,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM menu_items WHERE category_id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if items > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasItems)
            .with_detail("items", items)
            .into());
    }

    sqlx::query("UPDATE menu_categories SET deleted_at = $2, updated_at = $2 WHERE id = $1")
        .bind(id)
        .bind(shared::util::now_millis())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Shared row lock on a live category. Item writers hold it until commit,
/// which serialises them against `delete_category`'s `FOR UPDATE`.
const LOCK_CATEGORY_SHARED: &str = "SELECT id FROM menu_categories
     WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL FOR SHARE";

async fn lock_category(
    conn: &mut PgConnection,
    company_id: &str,
    category_id: i64,
) -> ServiceResult<()> {
    let locked: Option<(i64,)> = sqlx::query_as(LOCK_CATEGORY_SHARED)
        .bind(category_id)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await?;
    if locked.is_none() {
        return Err(AppError::new(ErrorCode::CategoryNotFound)
            .with_detail("category_id", category_id)
            .into());
    }
    Ok(())
}

// ── Items ──

fn push_item_filters(qb: &mut QueryBuilder<'_, Postgres>, company_id: &str, f: &MenuItemFilter) {
    qb.push(" WHERE company_id = ")
        .push_bind(company_id.to_string())
        .push(" AND deleted_at IS NULL");
    if let Some(category_id) = f.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(search) = f.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(available) = f.available {
        qb.push(" AND is_available = ").push_bind(available);
    }
    if let Some(featured) = f.featured {
        qb.push(" AND is_featured = ").push_bind(featured);
    }
    if let Some(min) = f.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = f.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
}

pub async fn list_items(
    pool: &PgPool,
    company_id: &str,
    filter: &MenuItemFilter,
) -> Result<(Vec<MenuItem>, i64, PageWindow), sqlx::Error> {
    let window = PageWindow::new(filter.page, filter.per_page);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM menu_items");
    push_item_filters(&mut count, company_id, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ITEM_COLUMNS} FROM menu_items"));
    push_item_filters(&mut qb, company_id, filter);
    qb.push(" ORDER BY ")
        .push(order_by(filter.sort.as_deref(), ITEM_SORT_KEYS))
        .push(", id LIMIT ")
        .push_bind(window.per_page)
        .push(" OFFSET ")
        .push_bind(window.offset());
    let items = qb.build_query_as::<MenuItem>().fetch_all(pool).await?;

    Ok((items, total, window))
}

pub async fn find_item(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_item(
    pool: &PgPool,
    company_id: &str,
    data: &MenuItemCreate,
    now: i64,
) -> ServiceResult<MenuItem> {
    let mut tx = pool.begin().await?;
    lock_category(&mut tx, company_id, data.category_id).await?;
    let tags = data.dietary_tags.clone().unwrap_or_default();

    let item = sqlx::query_as(&format!(
        "INSERT INTO menu_items (id, company_id, category_id, name, description, price, image_url,
            is_available, is_featured, dietary_tags, sort_order, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, TRUE), COALESCE($9, FALSE), $10, COALESCE($11, 0), $12, $12)
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(data.category_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.is_available)
    .bind(data.is_featured)
    .bind(&tags)
    .bind(data.sort_order)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(item)
}

pub async fn update_item(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &MenuItemUpdate,
    now: i64,
) -> ServiceResult<Option<MenuItem>> {
    let mut tx = pool.begin().await?;
    if let Some(category_id) = data.category_id {
        lock_category(&mut tx, company_id, category_id).await?;
    }

    let item = sqlx::query_as(&format!(
        "UPDATE menu_items SET
            category_id = COALESCE($3, category_id),
            name = COALESCE($4, name),
            description = COALESCE($5, description),
            price = COALESCE($6, price),
            image_url = COALESCE($7, image_url),
            is_available = COALESCE($8, is_available),
            is_featured = COALESCE($9, is_featured),
            dietary_tags = COALESCE($10, dietary_tags),
            sort_order = COALESCE($11, sort_order),
            updated_at = $12
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(data.category_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.is_available)
    .bind(data.is_featured)
    .bind(&data.dietary_tags)
    .bind(data.sort_order)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(item)
}

pub async fn soft_delete_item(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE menu_items SET deleted_at = $3, updated_at = $3
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(company_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Storefront menu: active categories with their available items
pub async fn public_menu(pool: &PgPool, company_id: &str) -> Result<Vec<MenuSection>, sqlx::Error> {
    let categories: Vec<MenuCategory> = sqlx::query_as(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM menu_categories
         WHERE company_id = $1 AND deleted_at IS NULL AND is_active
         ORDER BY sort_order, name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    let items: Vec<MenuItem> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM menu_items
         WHERE company_id = $1 AND deleted_at IS NULL AND is_available
         ORDER BY sort_order, name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    Ok(group_sections(categories, items))
}

/// Attach items to their categories, dropping categories left empty
fn group_sections(categories: Vec<MenuCategory>, items: Vec<MenuItem>) -> Vec<MenuSection> {
    let mut sections: Vec<MenuSection> = categories
        .into_iter()
        .map(|category| MenuSection {
            category,
            items: Vec::new(),
        })
        .collect();
    for item in items {
        if let Some(section) = sections.iter_mut().find(|s| s.category.id == item.category_id) {
            section.items.push(item);
        }
    }
    sections.retain(|s| !s.items.is_empty());
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn category(id: i64) -> MenuCategory {
        MenuCategory {
            id,
            name: format!("c{id}"),
            description: None,
            sort_order: 0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn item(id: i64, category_id: i64) -> MenuItem {
        MenuItem {
            id,
            category_id,
            name: format!("i{id}"),
            description: None,
            price: Decimal::new(1000, 2),
            image_url: None,
            is_available: true,
            is_featured: false,
            dietary_tags: vec![],
            sort_order: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_item_writers_share_lock_live_category() {
        let sql = LOCK_CATEGORY_SHARED.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(sql.contains("deleted_at IS NULL"));
        assert!(sql.ends_with("FOR SHARE"));
    }

    #[test]
    fn test_item_filter_sql() {
        let filter = MenuItemFilter {
            category_id: Some(3),
            search: Some("  pizza ".into()),
            available: Some(true),
            min_price: Some(Decimal::new(500, 2)),
            max_price: Some(Decimal::new(2000, 2)),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM menu_items");
        push_item_filters(&mut qb, "c1", &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM menu_items WHERE company_id = $1 AND deleted_at IS NULL \
             AND category_id = $2 AND (name ILIKE $3 OR description ILIKE $4) \
             AND is_available = $5 AND price >= $6 AND price <= $7"
        );
    }

    #[test]
    fn test_blank_search_ignored() {
        let filter = MenuItemFilter {
            search: Some("   ".into()),
            featured: Some(false),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM menu_items");
        push_item_filters(&mut qb, "c1", &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM menu_items WHERE company_id = $1 AND deleted_at IS NULL AND is_featured = $2"
        );
    }

    #[test]
    fn test_item_sort_keys() {
        assert_eq!(order_by(Some("-price"), ITEM_SORT_KEYS), "price DESC");
        assert_eq!(order_by(Some("created"), ITEM_SORT_KEYS), "created_at ASC");
        assert_eq!(order_by(Some("rating"), ITEM_SORT_KEYS), "sort_order ASC");
    }

    #[test]
    fn test_group_sections() {
        let sections = group_sections(
            vec![category(1), category(2), category(3)],
            vec![item(10, 1), item(11, 3), item(12, 1), item(13, 99)],
        );
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].category.id, 1);
        assert_eq!(sections[0].items.len(), 2);
        assert_eq!(sections[1].category.id, 3);
    }
}
