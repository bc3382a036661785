//! Stripe webhook handler
//!
//! POST /stripe/webhook: handles Stripe events (raw body for signature verification)
//!
//! Each event id is recorded before processing so redeliveries are skipped.
//! When processing fails the record is dropped again and 500 is returned,
//! which makes Stripe retry the event.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::Value;
use shared::models::SubscriptionStatus;
use shared::tenant::CompanyStatus;
use shared::util::now_millis;

use crate::db::subscriptions::UpsertSubscription;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::{db, stripe};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe/webhook", post(handle_webhook))
}

/// Handle incoming Stripe webhook events
///
/// Must receive raw body (not JSON) for HMAC signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.stripe_webhook_secret)
    {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(event_id) = event["id"].as_str() else {
        tracing::warn!("Webhook event missing id");
        return StatusCode::BAD_REQUEST;
    };
    tracing::info!(event_id, event_type, "Received Stripe webhook");

    match db::webhook_events::record(&state.pool, event_id, event_type, now_millis()).await {
        Ok(false) => {
            tracing::info!(event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK;
        }
        Ok(true) => {}
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    }

    let Some(obj) = event.get("data").and_then(|d| d.get("object")) else {
        return StatusCode::OK;
    };

    let outcome = match event_type {
        "checkout.session.completed" => checkout_completed(&state, obj).await,
        "customer.subscription.updated" => subscription_updated(&state, obj).await,
        "customer.subscription.deleted" => subscription_deleted(&state, obj).await,
        "invoice.payment_failed" => payment_failed(&state, obj).await,
        "invoice.paid" => invoice_paid(&state, obj).await,
        _ => {
            tracing::debug!(event_type, "Unhandled webhook event type");
            Ok(None)
        }
    };

    match outcome {
        Ok(Some(company_id)) => {
            state.module_cache.invalidate(&company_id).await;
            StatusCode::OK
        }
        Ok(None) => StatusCode::OK,
        Err(e) => {
            tracing::error!(event_id, event_type, error = ?e, "Webhook processing failed");
            if let Err(e) = db::webhook_events::forget(&state.pool, event_id).await {
                tracing::error!(%e, event_id, "Failed to release webhook event for retry");
            }
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Company whose access changed, if any
type Outcome = Result<Option<String>, ServiceError>;

/// Company status implied by a subscription status
fn company_status_for(status: SubscriptionStatus) -> Option<CompanyStatus> {
    match status {
        SubscriptionStatus::Active | SubscriptionStatus::Trialing => Some(CompanyStatus::Active),
        SubscriptionStatus::PastDue | SubscriptionStatus::Unpaid => Some(CompanyStatus::Suspended),
        SubscriptionStatus::Canceled => Some(CompanyStatus::Canceled),
        SubscriptionStatus::Incomplete => None,
    }
}

/// Stripe timestamps are seconds; everything stored here is millis
fn secs_to_millis(v: &Value) -> Option<i64> {
    v.as_i64().map(|s| s * 1000)
}

/// Period end of a subscription object (top level, or per item on newer API versions)
fn subscription_period_end(obj: &Value) -> Option<i64> {
    secs_to_millis(&obj["current_period_end"]).or_else(|| {
        obj.pointer("/items/data/0/current_period_end")
            .and_then(secs_to_millis)
    })
}

/// Subscription id referenced by an invoice
fn invoice_subscription(obj: &Value) -> Option<&str> {
    obj["subscription"].as_str().or_else(|| {
        obj.pointer("/parent/subscription_details/subscription")
            .and_then(Value::as_str)
    })
}

/// Period end of the first invoice line
fn invoice_period_end(obj: &Value) -> Option<i64> {
    obj.pointer("/lines/data/0/period/end").and_then(secs_to_millis)
}

/// checkout.session.completed → store subscription with the package features, activate company
async fn checkout_completed(state: &AppState, obj: &Value) -> Outcome {
    let (Some(customer_id), Some(subscription_id)) =
        (obj["customer"].as_str(), obj["subscription"].as_str())
    else {
        tracing::warn!("checkout.session.completed missing customer or subscription");
        return Ok(None);
    };

    let Some(company) = db::companies::find_by_stripe_customer(&state.pool, customer_id).await?
    else {
        tracing::warn!(customer_id, "No company for Stripe customer");
        return Ok(None);
    };

    let metadata = &obj["metadata"];
    let package_id = metadata["package_id"]
        .as_str()
        .and_then(|s| s.parse::<i64>().ok());
    let interval = metadata["interval"].as_str().unwrap_or("monthly");

    let features = match package_id {
        Some(id) => match db::packages::find_by_id(&state.pool, id).await? {
            Some(package) => package.features,
            None => {
                tracing::warn!(package_id = id, "Checkout for unknown package");
                Vec::new()
            }
        },
        None => {
            tracing::warn!(subscription_id, "Checkout session without package metadata");
            Vec::new()
        }
    };

    db::subscriptions::upsert(
        &state.pool,
        &UpsertSubscription {
            id: subscription_id,
            company_id: &company.id,
            package_id,
            status: SubscriptionStatus::Active.as_db(),
            billing_interval: interval,
            features: &features,
            current_period_end: None,
            now: now_millis(),
        },
    )
    .await?;
    db::companies::update_status(&state.pool, &company.id, CompanyStatus::Active.as_db()).await?;

    tracing::info!(
        company_id = %company.id,
        subscription_id,
        package_id,
        "Company subscribed via Stripe checkout"
    );
    db::audit::log(
        &state.pool,
        &company.id,
        None,
        "subscription.activated",
        Some(serde_json::json!({
            "subscription_id": subscription_id,
            "package_id": package_id,
            "interval": interval,
        })),
    )
    .await;

    Ok(Some(company.id))
}

/// customer.subscription.updated → mirror status, align company status
async fn subscription_updated(state: &AppState, obj: &Value) -> Outcome {
    let Some(sub_id) = obj["id"].as_str() else {
        return Ok(None);
    };
    let raw_status = obj["status"].as_str().unwrap_or_default();
    let Some(status) = SubscriptionStatus::from_db(raw_status) else {
        tracing::warn!(subscription_id = sub_id, status = raw_status, "Unknown subscription status");
        return Ok(None);
    };

    db::subscriptions::update_status(
        &state.pool,
        sub_id,
        status.as_db(),
        obj["cancel_at_period_end"].as_bool(),
        subscription_period_end(obj),
    )
    .await?;

    let Some(company_id) = db::subscriptions::find_company_by_sub_id(&state.pool, sub_id).await?
    else {
        return Ok(None);
    };
    if let Some(company_status) = company_status_for(status) {
        db::companies::update_status(&state.pool, &company_id, company_status.as_db()).await?;
    }

    tracing::info!(subscription_id = sub_id, status = status.as_db(), "Subscription updated");
    Ok(Some(company_id))
}

/// customer.subscription.deleted → cancel subscription + company
async fn subscription_deleted(state: &AppState, obj: &Value) -> Outcome {
    let Some(sub_id) = obj["id"].as_str() else {
        return Ok(None);
    };

    db::subscriptions::update_status(
        &state.pool,
        sub_id,
        SubscriptionStatus::Canceled.as_db(),
        None,
        None,
    )
    .await?;

    let Some(company_id) = db::subscriptions::find_company_by_sub_id(&state.pool, sub_id).await?
    else {
        return Ok(None);
    };
    db::companies::update_status(&state.pool, &company_id, CompanyStatus::Canceled.as_db())
        .await?;

    tracing::info!(company_id = %company_id, "Company canceled (subscription deleted)");
    db::audit::log(
        &state.pool,
        &company_id,
        None,
        "subscription.canceled",
        Some(serde_json::json!({ "subscription_id": sub_id })),
    )
    .await;

    Ok(Some(company_id))
}

/// invoice.payment_failed → subscription past_due, company suspended
async fn payment_failed(state: &AppState, obj: &Value) -> Outcome {
    let Some(sub_id) = invoice_subscription(obj) else {
        return Ok(None);
    };

    db::subscriptions::update_status(
        &state.pool,
        sub_id,
        SubscriptionStatus::PastDue.as_db(),
        None,
        None,
    )
    .await?;

    let Some(company_id) = db::subscriptions::find_company_by_sub_id(&state.pool, sub_id).await?
    else {
        return Ok(None);
    };
    db::companies::update_status(&state.pool, &company_id, CompanyStatus::Suspended.as_db())
        .await?;

    tracing::info!(company_id = %company_id, "Company suspended (payment failed)");
    db::audit::log(
        &state.pool,
        &company_id,
        None,
        "subscription.payment_failed",
        Some(serde_json::json!({ "subscription_id": sub_id })),
    )
    .await;

    Ok(Some(company_id))
}

/// invoice.paid → extend the period; a suspended company becomes active again
async fn invoice_paid(state: &AppState, obj: &Value) -> Outcome {
    let Some(sub_id) = invoice_subscription(obj) else {
        return Ok(None);
    };

    if let Some(period_end) = invoice_period_end(obj) {
        db::subscriptions::set_period_end(&state.pool, sub_id, period_end).await?;
    }

    let Some(company_id) = db::subscriptions::find_company_by_sub_id(&state.pool, sub_id).await?
    else {
        return Ok(None);
    };

    let status = db::companies::find_status(&state.pool, &company_id)
        .await?
        .and_then(|s| CompanyStatus::from_db(&s));
    if status == Some(CompanyStatus::Suspended) {
        db::subscriptions::update_status(
            &state.pool,
            sub_id,
            SubscriptionStatus::Active.as_db(),
            None,
            None,
        )
        .await?;
        db::companies::update_status(&state.pool, &company_id, CompanyStatus::Active.as_db())
            .await?;
        tracing::info!(company_id = %company_id, "Company reactivated (invoice paid)");
        db::audit::log(
            &state.pool,
            &company_id,
            None,
            "subscription.reactivated",
            Some(serde_json::json!({ "subscription_id": sub_id })),
        )
        .await;
    }

    tracing::info!(subscription_id = sub_id, "Invoice paid, period updated");
    Ok(Some(company_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_company_status_mapping() {
        assert_eq!(
            company_status_for(SubscriptionStatus::Trialing),
            Some(CompanyStatus::Active)
        );
        assert_eq!(
            company_status_for(SubscriptionStatus::Unpaid),
            Some(CompanyStatus::Suspended)
        );
        assert_eq!(
            company_status_for(SubscriptionStatus::Canceled),
            Some(CompanyStatus::Canceled)
        );
        assert_eq!(company_status_for(SubscriptionStatus::Incomplete), None);
    }

    #[test]
    fn test_invoice_fields() {
        let legacy = json!({
            "subscription": "sub_1",
            "lines": { "data": [ { "period": { "start": 1, "end": 1_700_000_000 } } ] }
        });
        assert_eq!(invoice_subscription(&legacy), Some("sub_1"));
        assert_eq!(invoice_period_end(&legacy), Some(1_700_000_000_000));

        let nested = json!({
            "parent": { "subscription_details": { "subscription": "sub_2" } },
            "lines": { "data": [] }
        });
        assert_eq!(invoice_subscription(&nested), Some("sub_2"));
        assert_eq!(invoice_period_end(&nested), None);
    }

    #[test]
    fn test_subscription_period_end() {
        assert_eq!(
            subscription_period_end(&json!({ "current_period_end": 10 })),
            Some(10_000)
        );
        assert_eq!(
            subscription_period_end(&json!({
                "items": { "data": [ { "current_period_end": 20 } ] }
            })),
            Some(20_000)
        );
        assert_eq!(subscription_period_end(&json!({})), None);
    }
}
