//! tavola-cloud: multi-tenant restaurant management backend
//!
//! - Dashboard API for company users (JWT authenticated, module gated)
//! - Public storefront API addressed by company slug
//! - Stripe checkout, billing portal and webhook handling

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod stripe;
pub mod theme;
pub mod util;
