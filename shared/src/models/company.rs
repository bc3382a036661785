//! Company (tenant) Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Company {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: String,
    #[serde(skip_serializing)]
    pub stripe_customer_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CompanyUpdate {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

/// Dashboard counters (`GET /api/dashboard`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub reservations_today: i64,
    pub open_orders: i64,
    pub low_stock_items: i64,
    pub open_tickets: i64,
    pub unread_contacts: i64,
}
