//! Pricing Package Model
//!
//! Packages are platform-global: managed by platform admins and listed on
//! the public pricing page. Each maps to two Stripe recurring prices and a
//! feature list of dashboard module identifiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PricingPackage {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub monthly_price: Decimal,
    pub yearly_price: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_price_monthly: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_price_yearly: Option<String>,
    pub features: Vec<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PricingPackage {
    /// Stripe price id for the chosen interval, if configured
    pub fn stripe_price(&self, interval: BillingInterval) -> Option<&str> {
        match interval {
            BillingInterval::Monthly => self.stripe_price_monthly.as_deref(),
            BillingInterval::Yearly => self.stripe_price_yearly.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PricingPackageCreate {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub monthly_price: Decimal,
    pub yearly_price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub stripe_price_monthly: Option<String>,
    pub stripe_price_yearly: Option<String>,
    pub features: Vec<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PricingPackageUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub monthly_price: Option<Decimal>,
    pub yearly_price: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub stripe_price_monthly: Option<String>,
    pub stripe_price_yearly: Option<String>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub package_id: i64,
    pub interval: BillingInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_price_by_interval() {
        let pkg = PricingPackage {
            id: 1,
            name: "Pro".into(),
            description: None,
            monthly_price: Decimal::new(4900, 2),
            yearly_price: Decimal::new(49000, 2),
            currency: "usd".into(),
            stripe_price_monthly: Some("price_m".into()),
            stripe_price_yearly: None,
            features: vec!["menu".into()],
            is_active: true,
            sort_order: 0,
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(pkg.stripe_price(BillingInterval::Monthly), Some("price_m"));
        assert_eq!(pkg.stripe_price(BillingInterval::Yearly), None);
    }

    #[test]
    fn test_interval_serde() {
        let req: CheckoutRequest =
            serde_json::from_str(r#"{"package_id":3,"interval":"yearly"}"#).unwrap();
        assert_eq!(req.interval, BillingInterval::Yearly);
        assert!(serde_json::from_str::<CheckoutRequest>(r#"{"package_id":3,"interval":"weekly"}"#).is_err());
    }
}
