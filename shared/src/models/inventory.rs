//! Inventory Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Inventory (stock) item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub quantity: Decimal,
    /// Unit of measure ("kg", "l", "pcs", ...)
    pub unit: String,
    /// Low-stock threshold; `quantity <= reorder_level` counts as low
    pub reorder_level: Decimal,
    pub unit_cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InventoryItemCreate {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub quantity: Option<Decimal>,
    #[validate(length(min = 1, max = 20))]
    pub unit: String,
    pub reorder_level: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    #[validate(length(max = 150))]
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InventoryItemUpdate {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    pub reorder_level: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    #[validate(length(max = 150))]
    pub supplier: Option<String>,
}

/// Relative stock change (`POST /api/inventory/{id}/adjust`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StockAdjustment {
    pub delta: Decimal,
    #[validate(length(max = 200))]
    pub reason: Option<String>,
}

/// Query filter for `GET /api/inventory`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub low_stock: Option<bool>,
    /// `name`, `quantity`, `updated`, `cost`; prefix `-` for descending
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, reorder: i64) -> InventoryItem {
        InventoryItem {
            id: 1,
            name: "Flour".into(),
            sku: None,
            category: None,
            quantity: Decimal::from(quantity),
            unit: "kg".into(),
            reorder_level: Decimal::from(reorder),
            unit_cost: None,
            supplier: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_low_stock_threshold_inclusive() {
        assert!(item(5, 5).is_low_stock());
        assert!(item(2, 5).is_low_stock());
        assert!(!item(6, 5).is_low_stock());
    }
}
