//! Shared types for Tavola
//!
//! Error codes and response envelopes, domain models and request payloads,
//! the role/module access table and small utilities used by the service.

pub mod error;
pub mod models;
pub mod modules;
pub mod tenant;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
