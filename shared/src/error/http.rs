//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CompanyNotFound
            | Self::PackageNotFound
            | Self::OrderNotFound
            | Self::ReservationNotFound
            | Self::TableNotFound
            | Self::MenuItemNotFound
            | Self::CategoryNotFound
            | Self::InventoryItemNotFound
            | Self::BlogPostNotFound
            | Self::BlogCategoryNotFound
            | Self::FaqNotFound
            | Self::CarouselImageNotFound
            | Self::TestimonialNotFound
            | Self::ContactNotFound
            | Self::TicketNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::EmailAlreadyRegistered
            | Self::CompanySlugExists
            | Self::ReservationConflict
            | Self::TableNameExists
            | Self::CategoryHasItems
            | Self::CategoryNameExists
            | Self::InventorySkuExists
            | Self::BlogSlugExists
            | Self::UserEmailExists
            | Self::OrderInvalidTransition
            | Self::ReservationInvalidTransition
            | Self::TicketInvalidTransition
            | Self::TicketClosed => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::RoleRequired
            | Self::ModuleNotEnabled
            | Self::CannotModifyOwner
            | Self::CannotDeleteSelf
            | Self::PlatformAdminRequired
            | Self::CompanyInactive
            | Self::SubscriptionBlocked => StatusCode::FORBIDDEN,

            // 402 Payment Required
            Self::NoSubscription => StatusCode::PAYMENT_REQUIRED,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 502 Bad Gateway (upstream payment provider)
            Self::PaymentSetupFailed | Self::PaymentProviderError => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::ReservationNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::CompanyNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ErrorCode::UserNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::ReservationConflict.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::CategoryHasItems.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::InventorySkuExists.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::TokenExpired.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::ModuleNotEnabled.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_misc_statuses() {
        assert_eq!(
            ErrorCode::TooManyRequests.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::NoSubscription.http_status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ErrorCode::PaymentSetupFailed.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::TimeoutError.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::InvalidTimeSlot.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::TableCapacityExceeded.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ReferenceNotFound.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::OrderEmpty.http_status(), StatusCode::BAD_REQUEST);
    }
}
