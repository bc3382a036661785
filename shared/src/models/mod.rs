//! Data models
//!
//! Shared between the cloud service and API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! IDs are `i64` snowflakes except company ids (UUID strings).

pub mod blog;
pub mod carousel;
pub mod company;
pub mod contact;
pub mod faq;
pub mod inventory;
pub mod menu;
pub mod order;
pub mod pagination;
pub mod pricing;
pub mod reservation;
pub mod settings;
pub mod subscription;
pub mod table;
pub mod testimonial;
pub mod ticket;
pub mod user;

// Re-exports
pub use blog::*;
pub use carousel::*;
pub use company::*;
pub use contact::*;
pub use faq::*;
pub use inventory::*;
pub use menu::*;
pub use order::*;
pub use pagination::*;
pub use pricing::*;
pub use reservation::*;
pub use settings::*;
pub use subscription::*;
pub use table::*;
pub use testimonial::*;
pub use ticket::*;
pub use user::*;
