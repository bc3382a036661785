//! Customer testimonials shown on the storefront

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Testimonial {
    pub id: i64,
    pub author_name: String,
    pub author_title: Option<String>,
    pub content: String,
    /// 1..=5 stars
    pub rating: i16,
    pub avatar_url: Option<String>,
    pub sort_order: i32,
    pub is_published: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TestimonialCreate {
    #[validate(length(min = 1, max = 120))]
    pub author_name: String,
    #[validate(length(max = 120))]
    pub author_title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TestimonialUpdate {
    #[validate(length(min = 1, max = 120))]
    pub author_name: Option<String>,
    #[validate(length(max = 120))]
    pub author_title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub content: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}
