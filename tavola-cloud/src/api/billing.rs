//! Billing endpoints: current subscription, Stripe checkout and portal

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CheckoutRequest, Subscription};
use shared::modules::Module;

use super::ApiResult;
use crate::auth::{CurrentUser, require_module};
use crate::state::AppState;
use crate::{db, stripe};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/billing/subscription", get(current_subscription))
        .route("/api/billing/checkout", post(create_checkout))
        .route("/api/billing/portal", post(billing_portal))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(Module::Billing),
        ))
}

#[derive(Debug, Serialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
}

#[derive(Debug, Serialize)]
pub struct PortalSession {
    pub url: String,
}

/// Subscription changes and the customer portal belong to the owner
fn require_owner(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_owner() {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::RoleRequired,
            "Only the company owner can manage billing",
        ))
    }
}

/// GET /api/billing/subscription (null when the company never subscribed)
pub async fn current_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Option<Subscription>> {
    Ok(Json(
        db::subscriptions::latest(&state.pool, &user.company_id).await?,
    ))
}

/// POST /api/billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<CheckoutSession> {
    require_owner(&user)?;

    let package = db::packages::find_by_id(&state.pool, req.package_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;
    let price_id = package
        .stripe_price(req.interval)
        .filter(|_| package.is_active)
        .ok_or_else(|| {
            AppError::new(ErrorCode::PackageNotPurchasable)
                .with_detail("package_id", package.id)
                .with_detail("interval", stripe::interval_str(req.interval))
        })?;

    let company = db::companies::find_by_id(&state.pool, &user.company_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;

    // Create or reuse Stripe customer
    let customer_id = match company.stripe_customer_id {
        Some(cid) => cid,
        None => {
            let created = state
                .stripe
                .create_customer(&company.email, &company.name, &company.id)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, company_id = %company.id, "Failed to create Stripe customer");
                    AppError::new(ErrorCode::PaymentSetupFailed)
                })?;
            // A concurrent checkout may have stored its customer first; use that one
            let stored = db::companies::claim_stripe_customer(&state.pool, &company.id, &created)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
            if stored != created {
                tracing::warn!(
                    company_id = %company.id,
                    unused_customer = %created,
                    "Stripe customer already set by a concurrent checkout"
                );
            }
            stored
        }
    };

    let success_url = format!("{}/billing?checkout=success", state.app_base_url);
    let cancel_url = format!("{}/billing?checkout=canceled", state.app_base_url);
    let url = state
        .stripe
        .create_checkout_session(
            &customer_id,
            price_id,
            package.id,
            req.interval,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, company_id = %company.id, "Failed to create Stripe checkout");
            AppError::new(ErrorCode::PaymentSetupFailed)
        })?;

    db::audit::log(
        &state.pool,
        &company.id,
        Some(user.user_id),
        "billing.checkout_created",
        Some(serde_json::json!({
            "package_id": package.id,
            "interval": stripe::interval_str(req.interval),
        })),
    )
    .await;

    Ok(Json(CheckoutSession { checkout_url: url }))
}

/// POST /api/billing/portal
pub async fn billing_portal(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<PortalSession> {
    require_owner(&user)?;

    let company = db::companies::find_by_id(&state.pool, &user.company_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    let customer_id = company
        .stripe_customer_id
        .as_deref()
        .ok_or_else(|| AppError::new(ErrorCode::BillingAccountMissing))?;

    let return_url = format!("{}/billing", state.app_base_url);
    let url = state
        .stripe
        .create_billing_portal_session(customer_id, &return_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Billing portal error");
            AppError::new(ErrorCode::PaymentSetupFailed)
        })?;

    Ok(Json(PortalSession { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::modules::Role;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            user_id: 1,
            company_id: "c1".into(),
            role,
            email: "someone@example.com".into(),
        }
    }

    #[test]
    fn test_billing_is_owner_only() {
        assert!(require_owner(&user(Role::Owner)).is_ok());
        for role in [Role::Admin, Role::Manager, Role::Staff, Role::PlatformAdmin] {
            let err = require_owner(&user(role)).unwrap_err();
            assert_eq!(err.code, ErrorCode::RoleRequired);
        }
    }

    #[test]
    fn test_session_bodies() {
        let checkout = serde_json::to_value(CheckoutSession {
            checkout_url: "https://checkout.stripe.com/c/pay/cs_1".into(),
        })
        .unwrap();
        assert_eq!(
            checkout,
            serde_json::json!({ "checkout_url": "https://checkout.stripe.com/c/pay/cs_1" })
        );

        let portal = serde_json::to_value(PortalSession {
            url: "https://billing.stripe.com/p/session/1".into(),
        })
        .unwrap();
        assert_eq!(portal["url"], "https://billing.stripe.com/p/session/1");
    }
}
