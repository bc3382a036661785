//! FAQ Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FaqItem {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub sort_order: i32,
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FaqItemCreate {
    #[validate(length(min = 1, max = 500))]
    pub question: String,
    #[validate(length(min = 1, max = 5000))]
    pub answer: String,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FaqItemUpdate {
    #[validate(length(min = 1, max = 500))]
    pub question: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub answer: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}
