//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`) so handlers can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (auto-logged, mapped to InternalError)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error (sqlx, Stripe transport, serde, etc.)
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    let constraint = db_err.constraint().unwrap_or_default();
                    return ServiceError::App(
                        AppError::new(conflict_code(constraint)).with_detail("constraint", constraint),
                    );
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    let constraint = db_err.constraint().unwrap_or_default();
                    return ServiceError::App(
                        AppError::new(ErrorCode::ReferenceNotFound)
                            .with_detail("constraint", constraint),
                    );
                }
                _ => {}
            }
        }
        ServiceError::Db(e.into())
    }
}

/// Unique constraint name → specific conflict code (names from migrations)
pub fn conflict_code(constraint: &str) -> ErrorCode {
    match constraint {
        "companies_slug_key" => ErrorCode::CompanySlugExists,
        "users_email_key" => ErrorCode::UserEmailExists,
        "dining_tables_company_name_key" => ErrorCode::TableNameExists,
        "menu_categories_company_name_key" => ErrorCode::CategoryNameExists,
        "inventory_items_company_sku_key" => ErrorCode::InventorySkuExists,
        "blog_posts_company_slug_key" | "blog_categories_company_slug_key" => {
            ErrorCode::BlogSlugExists
        }
        _ => ErrorCode::AlreadyExists,
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServiceError::App(e.into())
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_conflict_codes() {
        assert_eq!(conflict_code("companies_slug_key"), ErrorCode::CompanySlugExists);
        assert_eq!(
            conflict_code("inventory_items_company_sku_key"),
            ErrorCode::InventorySkuExists
        );
        assert_eq!(conflict_code("something_else"), ErrorCode::AlreadyExists);
        for c in [
            "users_email_key",
            "dining_tables_company_name_key",
            "blog_posts_company_slug_key",
            "",
        ] {
            assert_eq!(conflict_code(c).http_status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_db_error_is_internal() {
        let err = ServiceError::from(sqlx::Error::RowNotFound);
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
    }

    #[test]
    fn test_app_error_passes_through() {
        let err: ServiceError = AppError::new(ErrorCode::ReservationConflict).into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
