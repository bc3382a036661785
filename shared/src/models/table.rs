//! Dining Table Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub name: String,
    pub capacity: i32,
    /// Free-text area ("terrace", "main hall")
    pub area: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiningTableCreate {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(range(min = 1, max = 100))]
    pub capacity: Option<i32>,
    #[validate(length(max = 50))]
    pub area: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DiningTableUpdate {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub capacity: Option<i32>,
    #[validate(length(max = 50))]
    pub area: Option<String>,
    pub is_active: Option<bool>,
}
