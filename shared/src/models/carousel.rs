//! Storefront carousel images

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CarouselImage {
    pub id: i64,
    pub image_url: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CarouselImageCreate {
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 150))]
    pub title: Option<String>,
    #[validate(length(max = 300))]
    pub subtitle: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CarouselImageUpdate {
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(length(max = 150))]
    pub title: Option<String>,
    #[validate(length(max = 300))]
    pub subtitle: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
