//! Company (tenant) lifecycle status

use serde::{Deserialize, Serialize};

/// Company lifecycle status, stored lowercase in `companies.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    /// Registered and usable; may or may not have a paid subscription
    Active,
    /// Payment failed or past due
    Suspended,
    /// Subscription canceled by the processor
    Canceled,
}

impl CompanyStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Canceled => "canceled",
        }
    }

    /// Suspended companies can still log in to fix billing; canceled ones cannot.
    pub fn can_login(&self) -> bool {
        matches!(self, Self::Active | Self::Suspended)
    }

    /// Whether the public storefront is served
    pub fn storefront_visible(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_round_trip() {
        for s in [
            CompanyStatus::Active,
            CompanyStatus::Suspended,
            CompanyStatus::Canceled,
        ] {
            assert_eq!(CompanyStatus::from_db(s.as_db()), Some(s));
        }
        assert_eq!(CompanyStatus::from_db("ACTIVE"), None);
    }

    #[test]
    fn test_login_and_storefront() {
        assert!(CompanyStatus::Active.can_login());
        assert!(CompanyStatus::Suspended.can_login());
        assert!(!CompanyStatus::Canceled.can_login());
        assert!(CompanyStatus::Active.storefront_visible());
        assert!(!CompanyStatus::Suspended.storefront_visible());
    }
}
