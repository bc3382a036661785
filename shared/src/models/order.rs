//! Order Model
//!
//! Orders are priced server-side: each line copies the menu item's current
//! name and price at creation time so later menu edits do not rewrite history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// pending → preparing → ready → completed; cancel before it is ready
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Preparing)
                | (Self::Preparing, Self::Ready)
                | (Self::Ready, Self::Completed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Preparing, Self::Cancelled)
        )
    }

    /// Open orders show up on the dashboard counter
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Preparing | Self::Ready)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeout,
    Delivery,
}

impl OrderType {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::DineIn => "dine_in",
            Self::Takeout => "takeout",
            Self::Delivery => "delivery",
        }
    }
}

/// Order header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub order_type: String,
    pub status: String,
    pub table_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub total: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line (price snapshot)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub notes: Option<String>,
}

/// Order with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineInput {
    pub menu_item_id: i64,
    #[validate(range(min = 1, max = 999))]
    pub quantity: i32,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    pub order_type: OrderType,
    pub table_id: Option<i64>,
    #[validate(length(min = 1, max = 120))]
    pub customer_name: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[validate(length(max = 40))]
    pub customer_phone: Option<String>,
    #[validate(length(max = 500))]
    pub delivery_address: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 200), nested)]
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    /// Inclusive lower bound, Unix millis
    pub from: Option<i64>,
    /// Exclusive upper bound, Unix millis
    pub to: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Multiply unit price by quantity, rounded to cents
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    (unit_price * Decimal::from(quantity)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Preparing.can_transition_to(Cancelled));
        assert!(!Ready.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_open_statuses() {
        assert!(OrderStatus::Ready.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn test_line_total() {
        let price = Decimal::from_str("12.35").unwrap();
        assert_eq!(line_total(price, 3), Decimal::from_str("37.05").unwrap());
    }

    #[test]
    fn test_order_create_requires_items() {
        let payload: OrderCreate = serde_json::from_value(serde_json::json!({
            "order_type": "takeout",
            "items": []
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: OrderCreate = serde_json::from_value(serde_json::json!({
            "order_type": "dine_in",
            "table_id": 4,
            "items": [{ "menu_item_id": 1, "quantity": 2 }]
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_nested_line_validation() {
        let payload: OrderCreate = serde_json::from_value(serde_json::json!({
            "order_type": "takeout",
            "items": [{ "menu_item_id": 1, "quantity": 0 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
