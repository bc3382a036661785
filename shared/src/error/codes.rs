//! Unified error codes for the Tavola backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission / module access errors
//! - 3xxx: Tenant & billing errors
//! - 4xxx: Order errors
//! - 5xxx: Reservation & table errors
//! - 6xxx: Menu & inventory errors
//! - 7xxx: Content errors (blog, FAQ, carousel, testimonials, contacts)
//! - 8xxx: Support & user errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so the dashboard can switch on it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Referenced resource does not exist (foreign key)
    ReferenceNotFound = 9,
    /// Rate limit exceeded
    TooManyRequests = 10,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Email already registered
    EmailAlreadyRegistered = 1008,
    /// Password too short
    PasswordTooShort = 1009,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Dashboard module not enabled for this user/plan
    ModuleNotEnabled = 2003,
    /// Cannot modify the company owner
    CannotModifyOwner = 2004,
    /// Cannot delete own account
    CannotDeleteSelf = 2005,
    /// Platform administrator required
    PlatformAdminRequired = 2006,

    // ==================== 3xxx: Tenant & Billing ====================
    /// Company not found
    CompanyNotFound = 3002,
    /// Company is not active
    CompanyInactive = 3003,
    /// Subscription blocked (canceled or unpaid)
    SubscriptionBlocked = 3006,
    /// No active subscription for company
    NoSubscription = 3011,
    /// Payment setup failed (Stripe)
    PaymentSetupFailed = 3017,
    /// Pricing package not found
    PackageNotFound = 3020,
    /// Pricing package cannot be purchased (inactive or missing price)
    PackageNotPurchasable = 3021,
    /// Company has no billing account yet
    BillingAccountMissing = 3022,
    /// Company slug already taken
    CompanySlugExists = 3023,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4007,
    /// Order status transition not allowed
    OrderInvalidTransition = 4008,
    /// Menu item is unavailable for ordering
    MenuItemUnavailable = 4009,

    // ==================== 5xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 5001,
    /// Reservation overlaps a confirmed reservation on the same table
    ReservationConflict = 5002,
    /// Time slot is invalid (end not after start)
    InvalidTimeSlot = 5003,
    /// Party size exceeds table capacity
    TableCapacityExceeded = 5004,
    /// Reservation status transition not allowed
    ReservationInvalidTransition = 5005,
    /// Dining table not found
    TableNotFound = 5101,
    /// Dining table is inactive
    TableInactive = 5102,
    /// Dining table name already exists
    TableNameExists = 5103,

    // ==================== 6xxx: Menu & Inventory ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Price is invalid (negative)
    InvalidPrice = 6002,
    /// Menu category not found
    CategoryNotFound = 6101,
    /// Menu category still has items
    CategoryHasItems = 6102,
    /// Menu category name already exists
    CategoryNameExists = 6103,
    /// Inventory item not found
    InventoryItemNotFound = 6201,
    /// Inventory SKU already exists
    InventorySkuExists = 6202,
    /// Stock adjustment would go below zero
    InsufficientStock = 6203,

    // ==================== 7xxx: Content ====================
    /// Blog post not found
    BlogPostNotFound = 7001,
    /// Blog slug already exists
    BlogSlugExists = 7002,
    /// Blog category not found
    BlogCategoryNotFound = 7003,
    /// FAQ item not found
    FaqNotFound = 7101,
    /// Carousel image not found
    CarouselImageNotFound = 7201,
    /// Testimonial not found
    TestimonialNotFound = 7301,
    /// Contact submission not found
    ContactNotFound = 7401,

    // ==================== 8xxx: Support & Users ====================
    /// Support ticket not found
    TicketNotFound = 8001,
    /// Support ticket is closed
    TicketClosed = 8002,
    /// Ticket status transition not allowed
    TicketInvalidTransition = 8003,
    /// User not found
    UserNotFound = 8101,
    /// User email already exists
    UserEmailExists = 8102,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Payment provider returned an error
    PaymentProviderError = 9006,
}

impl ErrorCode {
    /// Every defined code, used for `u16` decoding
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::Success,
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::InvalidFormat,
        ErrorCode::RequiredField,
        ErrorCode::ValueOutOfRange,
        ErrorCode::ReferenceNotFound,
        ErrorCode::TooManyRequests,
        ErrorCode::NotAuthenticated,
        ErrorCode::InvalidCredentials,
        ErrorCode::TokenExpired,
        ErrorCode::TokenInvalid,
        ErrorCode::AccountDisabled,
        ErrorCode::EmailAlreadyRegistered,
        ErrorCode::PasswordTooShort,
        ErrorCode::PermissionDenied,
        ErrorCode::RoleRequired,
        ErrorCode::ModuleNotEnabled,
        ErrorCode::CannotModifyOwner,
        ErrorCode::CannotDeleteSelf,
        ErrorCode::PlatformAdminRequired,
        ErrorCode::CompanyNotFound,
        ErrorCode::CompanyInactive,
        ErrorCode::SubscriptionBlocked,
        ErrorCode::NoSubscription,
        ErrorCode::PaymentSetupFailed,
        ErrorCode::PackageNotFound,
        ErrorCode::PackageNotPurchasable,
        ErrorCode::BillingAccountMissing,
        ErrorCode::CompanySlugExists,
        ErrorCode::OrderNotFound,
        ErrorCode::OrderEmpty,
        ErrorCode::OrderInvalidTransition,
        ErrorCode::MenuItemUnavailable,
        ErrorCode::ReservationNotFound,
        ErrorCode::ReservationConflict,
        ErrorCode::InvalidTimeSlot,
        ErrorCode::TableCapacityExceeded,
        ErrorCode::ReservationInvalidTransition,
        ErrorCode::TableNotFound,
        ErrorCode::TableInactive,
        ErrorCode::TableNameExists,
        ErrorCode::MenuItemNotFound,
        ErrorCode::InvalidPrice,
        ErrorCode::CategoryNotFound,
        ErrorCode::CategoryHasItems,
        ErrorCode::CategoryNameExists,
        ErrorCode::InventoryItemNotFound,
        ErrorCode::InventorySkuExists,
        ErrorCode::InsufficientStock,
        ErrorCode::BlogPostNotFound,
        ErrorCode::BlogSlugExists,
        ErrorCode::BlogCategoryNotFound,
        ErrorCode::FaqNotFound,
        ErrorCode::CarouselImageNotFound,
        ErrorCode::TestimonialNotFound,
        ErrorCode::ContactNotFound,
        ErrorCode::TicketNotFound,
        ErrorCode::TicketClosed,
        ErrorCode::TicketInvalidTransition,
        ErrorCode::UserNotFound,
        ErrorCode::UserEmailExists,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::NetworkError,
        ErrorCode::TimeoutError,
        ErrorCode::ConfigError,
        ErrorCode::PaymentProviderError,
    ];

    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::ReferenceNotFound => "Referenced resource does not exist",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::EmailAlreadyRegistered => "Email already registered",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::ModuleNotEnabled => "Module is not enabled for this account",
            ErrorCode::CannotModifyOwner => "Cannot modify the company owner",
            ErrorCode::CannotDeleteSelf => "Cannot delete your own account",
            ErrorCode::PlatformAdminRequired => "Platform administrator role is required",

            // Tenant & Billing
            ErrorCode::CompanyNotFound => "Company not found",
            ErrorCode::CompanyInactive => "Company is not active",
            ErrorCode::SubscriptionBlocked => "Subscription is canceled or unpaid",
            ErrorCode::NoSubscription => "No active subscription",
            ErrorCode::PaymentSetupFailed => "Payment setup failed",
            ErrorCode::PackageNotFound => "Pricing package not found",
            ErrorCode::PackageNotPurchasable => "Pricing package cannot be purchased",
            ErrorCode::BillingAccountMissing => "No billing account for this company",
            ErrorCode::CompanySlugExists => "Company slug already taken",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderInvalidTransition => "Order status change not allowed",
            ErrorCode::MenuItemUnavailable => "Menu item is not available",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationConflict => {
                "Time slot overlaps a confirmed reservation for this table"
            }
            ErrorCode::InvalidTimeSlot => "End time must be after start time",
            ErrorCode::TableCapacityExceeded => "Party size exceeds table capacity",
            ErrorCode::ReservationInvalidTransition => "Reservation status change not allowed",
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableInactive => "Table is not active",
            ErrorCode::TableNameExists => "Table name already exists",

            // Menu & Inventory
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::InvalidPrice => "Price must not be negative",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasItems => "Category still has menu items",
            ErrorCode::CategoryNameExists => "Category name already exists",
            ErrorCode::InventoryItemNotFound => "Inventory item not found",
            ErrorCode::InventorySkuExists => "SKU already exists",
            ErrorCode::InsufficientStock => "Stock cannot go below zero",

            // Content
            ErrorCode::BlogPostNotFound => "Blog post not found",
            ErrorCode::BlogSlugExists => "Blog slug already exists",
            ErrorCode::BlogCategoryNotFound => "Blog category not found",
            ErrorCode::FaqNotFound => "FAQ item not found",
            ErrorCode::CarouselImageNotFound => "Carousel image not found",
            ErrorCode::TestimonialNotFound => "Testimonial not found",
            ErrorCode::ContactNotFound => "Contact submission not found",

            // Support & Users
            ErrorCode::TicketNotFound => "Support ticket not found",
            ErrorCode::TicketClosed => "Support ticket is closed",
            ErrorCode::TicketInvalidTransition => "Ticket status change not allowed",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UserEmailExists => "User email already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::PaymentProviderError => "Payment provider error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|c| c.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::ModuleNotEnabled.code(), 2003);
        assert_eq!(ErrorCode::CompanyNotFound.code(), 3002);
        assert_eq!(ErrorCode::ReservationConflict.code(), 5002);
        assert_eq!(ErrorCode::InventorySkuExists.code(), 6202);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn test_try_from_u16() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::ReservationConflict).unwrap();
        assert_eq!(json, "5002");
        let code: ErrorCode = serde_json::from_str("6102").unwrap();
        assert_eq!(code, ErrorCode::CategoryHasItems);
        assert!(serde_json::from_str::<ErrorCode>("31337").is_err());
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
    }
}
