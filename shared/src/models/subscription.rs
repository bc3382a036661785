//! Subscription Model (mirror of the Stripe subscription)

use serde::{Deserialize, Serialize};

/// Stripe subscription status as stored locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
}

impl SubscriptionStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "trialing" => Some(Self::Trialing),
            "past_due" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            "unpaid" => Some(Self::Unpaid),
            "incomplete" | "incomplete_expired" => Some(Self::Incomplete),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Incomplete => "incomplete",
        }
    }

    /// Whether plan features are granted in this status
    pub fn grants_features(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Subscription {
    /// Stripe subscription id
    pub id: String,
    pub company_id: String,
    pub package_id: Option<i64>,
    pub status: String,
    pub billing_interval: String,
    pub features: Vec<String>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from_db("incomplete_expired"),
            Some(SubscriptionStatus::Incomplete)
        );
        assert_eq!(SubscriptionStatus::from_db("paused"), None);
        assert!(SubscriptionStatus::Trialing.grants_features());
        assert!(!SubscriptionStatus::PastDue.grants_features());
    }
}
