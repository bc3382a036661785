//! Menu Model (categories and items)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Menu category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuCategoryCreate {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MenuCategoryUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub is_featured: bool,
    /// Free-form dietary labels ("vegan", "gluten_free", ...)
    pub dietary_tags: Vec<String>,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuItemCreate {
    pub category_id: i64,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub dietary_tags: Option<Vec<String>>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MenuItemUpdate {
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub dietary_tags: Option<Vec<String>>,
    pub sort_order: Option<i32>,
}

/// Query filter for `GET /api/menu/items`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemFilter {
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// `name`, `price`, `created`, `sort_order`; prefix `-` for descending
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Storefront menu section: one category with its available items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuSection {
    pub category: MenuCategory,
    pub items: Vec<MenuItem>,
}
